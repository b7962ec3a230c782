//! # Integration Store
//!
//! Persistence for third-party integrations: OAuth client credentials and
//! tokens, time-stamped data points and per-integration key/value settings.
//! Two interchangeable [`repositories::IntegrationStore`] implementations sit
//! over one SeaORM pool, one built on the entity query builder and one on
//! hand-written SQL.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod telemetry;
pub use migration;

pub use error::StoreError;
pub use repositories::{
    IntegrationStore, IntegrationUpsert, OrmIntegrationStore, SortDirection, SqlIntegrationStore,
    UpsertOutcome,
};
