//! # Repository Layer
//!
//! [`IntegrationStore`] is the data-access facade for one named integration:
//! its credentials and token state, its append-only data points and its
//! key/value settings. Every operation is scoped to the integration name the
//! store was opened with.
//!
//! Two implementations share the trait: [`OrmIntegrationStore`] drives the
//! SeaORM entity API, [`SqlIntegrationStore`] executes hand-written
//! parameterized SQL. Both issue each mutation as a single statement, so the
//! uniqueness and staleness rules hold under concurrent callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{integration, integration_data, setting};

pub mod orm;
pub mod sql;

pub use orm::OrmIntegrationStore;
pub use sql::SqlIntegrationStore;

/// Default `limit_query` for a newly written integration.
pub const DEFAULT_LIMIT_QUERY: i64 = 5;

/// Full set of fields written by [`IntegrationStore::upsert_integration`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationUpsert {
    pub account_id: i64,
    pub subdomain: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub last_query_at: i64,
    pub refresh_token: String,
    pub access_token: String,
    pub expire_access_token: i64,
    pub expire_refresh_token: i64,
    pub free_query: i64,
    #[serde(default = "default_limit_query")]
    pub limit_query: i64,
}

fn default_limit_query() -> i64 {
    DEFAULT_LIMIT_QUERY
}

impl std::fmt::Debug for IntegrationUpsert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationUpsert")
            .field("account_id", &self.account_id)
            .field("subdomain", &self.subdomain)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("last_query_at", &self.last_query_at)
            .field("expire_access_token", &self.expire_access_token)
            .field("expire_refresh_token", &self.expire_refresh_token)
            .field("free_query", &self.free_query)
            .field("limit_query", &self.limit_query)
            .finish_non_exhaustive()
    }
}

/// Result of [`IntegrationStore::upsert_integration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// The row was inserted or fully overwritten.
    Written,
    /// The stored access token expires later than the incoming one; nothing
    /// was changed.
    Stale,
}

/// Ordering of data points by `created_at` (ties broken by `id`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest first. Default, matching the behaviour deployed callers rely on.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(StoreError::validation_error(format!(
                "unknown sort direction '{}'",
                other
            ))),
        }
    }
}

/// Data access for a single named integration.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Name every operation is scoped to.
    fn integration_name(&self) -> &str;

    /// Insert a row holding only the client credentials. Returns `false`
    /// without touching anything when a row for this name already exists.
    async fn add_secrets(&self, client_id: &str, client_secret: &str) -> Result<bool, StoreError>;

    /// Insert or fully overwrite the integration row, unless the stored
    /// `expire_access_token` is non-null and strictly greater than the
    /// incoming one.
    async fn upsert_integration(
        &self,
        fields: &IntegrationUpsert,
    ) -> Result<UpsertOutcome, StoreError>;

    async fn get_integration(&self) -> Result<Option<integration::Model>, StoreError>;

    /// Returns whether a row was removed; a missing row is not an error.
    async fn delete_integration(&self) -> Result<bool, StoreError>;

    /// Append a data point. No deduplication.
    async fn add_data_point(
        &self,
        data_name: &str,
        data: &str,
    ) -> Result<integration_data::Model, StoreError>;

    /// First data point for `data_name` in the given order: `Asc` yields the
    /// oldest, `Desc` the newest.
    async fn get_latest_data_point(
        &self,
        data_name: &str,
        direction: SortDirection,
    ) -> Result<Option<integration_data::Model>, StoreError>;

    /// All data points for `data_name`, oldest first. Empty when none exist.
    async fn get_data_points(
        &self,
        data_name: &str,
    ) -> Result<Vec<integration_data::Model>, StoreError>;

    /// Delete a data point by id. Returns whether a row was removed.
    async fn delete_data_point(&self, id: i32) -> Result<bool, StoreError>;

    /// Insert the setting, or replace its value when the key exists.
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn get_setting(&self, key: &str) -> Result<Option<setting::Model>, StoreError>;

    /// All settings of this integration ordered by key.
    async fn list_settings(&self) -> Result<Vec<setting::Model>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_setting(&self, key: &str) -> Result<bool, StoreError>;
}

/// Rejects a blank name. The name is stored exactly as given.
pub(crate) fn validate_integration_name(name: &str) -> Result<String, StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::validation_error(
            "integration name must not be empty",
        ));
    }
    Ok(name.to_string())
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::validation_error(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

pub(crate) fn record_stale_write(integration_name: &str, incoming_expiry: i64) {
    tracing::debug!(
        integration = %integration_name,
        incoming_expire_access_token = incoming_expiry,
        "Stored access token is newer, skipping integration update"
    );
    metrics::counter!("integration_store_stale_writes_total").increment(1);
}

pub(crate) fn record_secrets_skipped(integration_name: &str) {
    tracing::debug!(
        integration = %integration_name,
        "Integration already exists, secrets left unchanged"
    );
    metrics::counter!("integration_store_secrets_skipped_total").increment(1);
}
