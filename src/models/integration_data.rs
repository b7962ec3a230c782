//! Integration data point entity model
//!
//! Rows are written once and never updated; the table behaves as an
//! append-only log keyed by `(integration_name, data_name)`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// A timestamped named payload belonging to an integration
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "integrations_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub integration_name: String,

    /// Insert time, stamped by the application
    pub created_at: DateTimeWithTimeZone,

    pub data_name: String,

    #[sea_orm(column_type = "Text")]
    pub data: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
