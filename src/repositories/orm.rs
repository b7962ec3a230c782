//! SeaORM-backed [`IntegrationStore`].
//!
//! Uniqueness and staleness rules are expressed as `ON CONFLICT` clauses on a
//! single insert so there is no read-then-write window.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    IntegrationStore, IntegrationUpsert, SortDirection, UpsertOutcome, record_secrets_skipped,
    record_stale_write, require_non_empty, validate_integration_name,
};
use crate::error::StoreError;
use crate::models::integration::{self, Entity as Integration};
use crate::models::integration_data::{self, Entity as IntegrationData};
use crate::models::setting::{self, Entity as Setting};

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// Store implementation using the SeaORM entity API
#[derive(Debug, Clone)]
pub struct OrmIntegrationStore {
    /// Database connection pool
    db: Arc<DatabaseConnection>,
    integration_name: String,
}

impl OrmIntegrationStore {
    /// Creates a store scoped to `integration_name`
    pub fn new(db: Arc<DatabaseConnection>, integration_name: &str) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            integration_name: validate_integration_name(integration_name)?,
        })
    }
}

#[async_trait]
impl IntegrationStore for OrmIntegrationStore {
    fn integration_name(&self) -> &str {
        &self.integration_name
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn add_secrets(&self, client_id: &str, client_secret: &str) -> Result<bool, StoreError> {
        let row = integration::ActiveModel {
            integration_name: Set(self.integration_name.clone()),
            client_id: Set(Some(client_id.to_string())),
            client_secret: Set(Some(client_secret.to_string())),
            ..Default::default()
        };

        let inserted = Integration::insert(row)
            .on_conflict(
                OnConflict::column(integration::Column::IntegrationName)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await
            .map_err(StoreError::from_db)?;

        if inserted == 0 {
            record_secrets_skipped(&self.integration_name);
            return Ok(false);
        }
        Ok(true)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn upsert_integration(
        &self,
        fields: &IntegrationUpsert,
    ) -> Result<UpsertOutcome, StoreError> {
        let row = integration::ActiveModel {
            integration_name: Set(self.integration_name.clone()),
            account_id: Set(Some(fields.account_id)),
            subdomain: Set(Some(fields.subdomain.clone())),
            client_id: Set(Some(fields.client_id.clone())),
            client_secret: Set(Some(fields.client_secret.clone())),
            redirect_uri: Set(Some(fields.redirect_uri.clone())),
            last_query_at: Set(Some(fields.last_query_at)),
            refresh_token: Set(Some(fields.refresh_token.clone())),
            access_token: Set(Some(fields.access_token.clone())),
            expire_access_token: Set(Some(fields.expire_access_token)),
            expire_refresh_token: Set(Some(fields.expire_refresh_token)),
            free_query: Set(Some(fields.free_query)),
            limit_query: Set(Some(fields.limit_query)),
            ..Default::default()
        };

        let stored_expiry = || Expr::col((Integration, integration::Column::ExpireAccessToken));

        // Overwrite only when the stored expiry is unknown or not newer.
        let on_conflict = OnConflict::column(integration::Column::IntegrationName)
            .update_columns([
                integration::Column::AccountId,
                integration::Column::Subdomain,
                integration::Column::ClientId,
                integration::Column::ClientSecret,
                integration::Column::RedirectUri,
                integration::Column::LastQueryAt,
                integration::Column::RefreshToken,
                integration::Column::AccessToken,
                integration::Column::ExpireAccessToken,
                integration::Column::ExpireRefreshToken,
                integration::Column::FreeQuery,
                integration::Column::LimitQuery,
            ])
            .action_and_where(
                stored_expiry()
                    .is_null()
                    .or(stored_expiry().lte(fields.expire_access_token)),
            )
            .to_owned();

        let affected = Integration::insert(row)
            .on_conflict(on_conflict)
            .exec_without_returning(&*self.db)
            .await
            .map_err(StoreError::from_db)?;

        if affected == 0 {
            record_stale_write(&self.integration_name, fields.expire_access_token);
            return Ok(UpsertOutcome::Stale);
        }
        Ok(UpsertOutcome::Written)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn get_integration(&self) -> Result<Option<integration::Model>, StoreError> {
        Integration::find()
            .filter(integration::Column::IntegrationName.eq(self.integration_name.as_str()))
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn delete_integration(&self) -> Result<bool, StoreError> {
        let result = Integration::delete_many()
            .filter(integration::Column::IntegrationName.eq(self.integration_name.as_str()))
            .exec(&*self.db)
            .await
            .map_err(StoreError::from_db)?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, data_name = %data_name))]
    async fn add_data_point(
        &self,
        data_name: &str,
        data: &str,
    ) -> Result<integration_data::Model, StoreError> {
        require_non_empty("data name", data_name)?;

        let row = integration_data::ActiveModel {
            integration_name: Set(self.integration_name.clone()),
            created_at: Set(Utc::now().into()),
            data_name: Set(data_name.to_string()),
            data: Set(data.to_string()),
            ..Default::default()
        };

        row.insert(&*self.db).await.map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, data_name = %data_name))]
    async fn get_latest_data_point(
        &self,
        data_name: &str,
        direction: SortDirection,
    ) -> Result<Option<integration_data::Model>, StoreError> {
        IntegrationData::find()
            .filter(integration_data::Column::IntegrationName.eq(self.integration_name.as_str()))
            .filter(integration_data::Column::DataName.eq(data_name))
            .order_by(integration_data::Column::CreatedAt, direction.into())
            .order_by(integration_data::Column::Id, direction.into())
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, data_name = %data_name))]
    async fn get_data_points(
        &self,
        data_name: &str,
    ) -> Result<Vec<integration_data::Model>, StoreError> {
        IntegrationData::find()
            .filter(integration_data::Column::IntegrationName.eq(self.integration_name.as_str()))
            .filter(integration_data::Column::DataName.eq(data_name))
            .order_by_asc(integration_data::Column::CreatedAt)
            .order_by_asc(integration_data::Column::Id)
            .all(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, id = id))]
    async fn delete_data_point(&self, id: i32) -> Result<bool, StoreError> {
        let result = IntegrationData::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(StoreError::from_db)?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, key = %key))]
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        require_non_empty("setting key", key)?;

        let row = setting::ActiveModel {
            integration_name: Set(self.integration_name.clone()),
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            ..Default::default()
        };

        Setting::insert(row)
            .on_conflict(
                OnConflict::columns([setting::Column::IntegrationName, setting::Column::Key])
                    .update_column(setting::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await
            .map_err(StoreError::from_db)?;
        Ok(())
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, key = %key))]
    async fn get_setting(&self, key: &str) -> Result<Option<setting::Model>, StoreError> {
        Setting::find()
            .filter(setting::Column::IntegrationName.eq(self.integration_name.as_str()))
            .filter(setting::Column::Key.eq(key))
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn list_settings(&self) -> Result<Vec<setting::Model>, StoreError> {
        Setting::find()
            .filter(setting::Column::IntegrationName.eq(self.integration_name.as_str()))
            .order_by_asc(setting::Column::Key)
            .all(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, key = %key))]
    async fn delete_setting(&self, key: &str) -> Result<bool, StoreError> {
        let result = Setting::delete_many()
            .filter(setting::Column::IntegrationName.eq(self.integration_name.as_str()))
            .filter(setting::Column::Key.eq(key))
            .exec(&*self.db)
            .await
            .map_err(StoreError::from_db)?;
        Ok(result.rows_affected > 0)
    }
}
