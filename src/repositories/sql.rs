//! [`IntegrationStore`] over hand-written parameterized SQL.
//!
//! Statements are written with Postgres-style `$N` placeholders, numbered in
//! order of appearance, and rewritten to `?` for SQLite. User data is always
//! bound; the only interpolated fragment is the closed [`SortDirection`]
//! keyword.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, ExecResult, Statement,
    Value,
};
use std::sync::{Arc, LazyLock};
use tracing::instrument;

use super::{
    IntegrationStore, IntegrationUpsert, SortDirection, UpsertOutcome, record_secrets_skipped,
    record_stale_write, require_non_empty, validate_integration_name,
};
use crate::error::StoreError;
use crate::models::integration::{self, Entity as Integration};
use crate::models::integration_data::{self, Entity as IntegrationData};
use crate::models::setting::{self, Entity as Setting};

static NUMBERED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d+").expect("placeholder pattern is valid"));

const INSERT_SECRETS: &str = r#"
    INSERT INTO integrations (integration_name, client_id, client_secret)
    VALUES ($1, $2, $3)
    ON CONFLICT (integration_name) DO NOTHING
"#;

const UPSERT_INTEGRATION: &str = r#"
    INSERT INTO integrations (
        integration_name, account_id, subdomain, client_id, client_secret,
        redirect_uri, last_query_at, refresh_token, access_token,
        expire_access_token, expire_refresh_token, free_query, limit_query
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
    ON CONFLICT (integration_name) DO UPDATE SET
        account_id = excluded.account_id,
        subdomain = excluded.subdomain,
        client_id = excluded.client_id,
        client_secret = excluded.client_secret,
        redirect_uri = excluded.redirect_uri,
        last_query_at = excluded.last_query_at,
        refresh_token = excluded.refresh_token,
        access_token = excluded.access_token,
        expire_access_token = excluded.expire_access_token,
        expire_refresh_token = excluded.expire_refresh_token,
        free_query = excluded.free_query,
        limit_query = excluded.limit_query
    WHERE integrations.expire_access_token IS NULL
       OR integrations.expire_access_token <= excluded.expire_access_token
"#;

const SELECT_INTEGRATION: &str = r#"
    SELECT id, integration_name, account_id, subdomain, client_id, client_secret,
           redirect_uri, last_query_at, refresh_token, access_token,
           expire_access_token, expire_refresh_token, free_query, limit_query
    FROM integrations
    WHERE integration_name = $1
"#;

const DELETE_INTEGRATION: &str = "DELETE FROM integrations WHERE integration_name = $1";

const INSERT_DATA_POINT: &str = r#"
    INSERT INTO integrations_data (integration_name, created_at, data_name, data)
    VALUES ($1, $2, $3, $4)
    RETURNING id, integration_name, created_at, data_name, data
"#;

const SELECT_DATA_POINTS: &str = r#"
    SELECT id, integration_name, created_at, data_name, data
    FROM integrations_data
    WHERE integration_name = $1 AND data_name = $2
"#;

const DELETE_DATA_POINT: &str = "DELETE FROM integrations_data WHERE id = $1";

const UPSERT_SETTING: &str = r#"
    INSERT INTO settings (integration_name, key, value)
    VALUES ($1, $2, $3)
    ON CONFLICT (integration_name, key) DO UPDATE SET value = excluded.value
"#;

const SELECT_SETTINGS: &str = r#"
    SELECT id, integration_name, key, value
    FROM settings
    WHERE integration_name = $1
"#;

const DELETE_SETTING: &str = "DELETE FROM settings WHERE integration_name = $1 AND key = $2";

/// Rewrites `$N` placeholders for backends that only understand `?`.
fn bind_style(backend: DatabaseBackend, sql: &str) -> String {
    match backend {
        DatabaseBackend::Postgres => sql.to_string(),
        _ => NUMBERED_PLACEHOLDER.replace_all(sql, "?").into_owned(),
    }
}

/// Store implementation issuing raw parameterized SQL
#[derive(Debug, Clone)]
pub struct SqlIntegrationStore {
    /// Database connection pool
    db: Arc<DatabaseConnection>,
    integration_name: String,
}

impl SqlIntegrationStore {
    /// Creates a store scoped to `integration_name`
    pub fn new(db: Arc<DatabaseConnection>, integration_name: &str) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            integration_name: validate_integration_name(integration_name)?,
        })
    }

    fn statement(&self, sql: &str, values: Vec<Value>) -> Statement {
        let backend = self.db.get_database_backend();
        Statement::from_sql_and_values(backend, bind_style(backend, sql), values)
    }

    async fn execute(&self, sql: &str, values: Vec<Value>) -> Result<ExecResult, StoreError> {
        self.db
            .execute(self.statement(sql, values))
            .await
            .map_err(StoreError::from_db)
    }

    fn name_value(&self) -> Value {
        self.integration_name.clone().into()
    }
}

#[async_trait]
impl IntegrationStore for SqlIntegrationStore {
    fn integration_name(&self) -> &str {
        &self.integration_name
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn add_secrets(&self, client_id: &str, client_secret: &str) -> Result<bool, StoreError> {
        let result = self
            .execute(
                INSERT_SECRETS,
                vec![self.name_value(), client_id.into(), client_secret.into()],
            )
            .await?;

        if result.rows_affected() == 0 {
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
        let result = self
            .execute(
                UPSERT_INTEGRATION,
                vec![
                    self.name_value(),
                    fields.account_id.into(),
                    fields.subdomain.as_str().into(),
                    fields.client_id.as_str().into(),
                    fields.client_secret.as_str().into(),
                    fields.redirect_uri.as_str().into(),
                    fields.last_query_at.into(),
                    fields.refresh_token.as_str().into(),
                    fields.access_token.as_str().into(),
                    fields.expire_access_token.into(),
                    fields.expire_refresh_token.into(),
                    fields.free_query.into(),
                    fields.limit_query.into(),
                ],
            )
            .await?;

        if result.rows_affected() == 0 {
            record_stale_write(&self.integration_name, fields.expire_access_token);
            return Ok(UpsertOutcome::Stale);
        }
        Ok(UpsertOutcome::Written)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn get_integration(&self) -> Result<Option<integration::Model>, StoreError> {
        Integration::find()
            .from_raw_sql(self.statement(SELECT_INTEGRATION, vec![self.name_value()]))
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn delete_integration(&self) -> Result<bool, StoreError> {
        let result = self
            .execute(DELETE_INTEGRATION, vec![self.name_value()])
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, data_name = %data_name))]
    async fn add_data_point(
        &self,
        data_name: &str,
        data: &str,
    ) -> Result<integration_data::Model, StoreError> {
        require_non_empty("data name", data_name)?;

        let created_at: DateTimeWithTimeZone = Utc::now().into();
        let stmt = self.statement(
            INSERT_DATA_POINT,
            vec![
                self.name_value(),
                created_at.into(),
                data_name.into(),
                data.into(),
            ],
        );

        IntegrationData::find()
            .from_raw_sql(stmt)
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)?
            .ok_or(StoreError::Database(sea_orm::DbErr::RecordNotInserted))
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, data_name = %data_name))]
    async fn get_latest_data_point(
        &self,
        data_name: &str,
        direction: SortDirection,
    ) -> Result<Option<integration_data::Model>, StoreError> {
        let order = direction.as_sql();
        let sql = format!(
            "{SELECT_DATA_POINTS} ORDER BY created_at {order}, id {order} LIMIT 1"
        );

        IntegrationData::find()
            .from_raw_sql(self.statement(&sql, vec![self.name_value(), data_name.into()]))
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, data_name = %data_name))]
    async fn get_data_points(
        &self,
        data_name: &str,
    ) -> Result<Vec<integration_data::Model>, StoreError> {
        let sql = format!("{SELECT_DATA_POINTS} ORDER BY created_at ASC, id ASC");

        IntegrationData::find()
            .from_raw_sql(self.statement(&sql, vec![self.name_value(), data_name.into()]))
            .all(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, id = id))]
    async fn delete_data_point(&self, id: i32) -> Result<bool, StoreError> {
        let result = self.execute(DELETE_DATA_POINT, vec![id.into()]).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, key = %key))]
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        require_non_empty("setting key", key)?;

        self.execute(
            UPSERT_SETTING,
            vec![self.name_value(), key.into(), value.into()],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, key = %key))]
    async fn get_setting(&self, key: &str) -> Result<Option<setting::Model>, StoreError> {
        let sql = format!("{SELECT_SETTINGS} AND key = $2");

        Setting::find()
            .from_raw_sql(self.statement(&sql, vec![self.name_value(), key.into()]))
            .one(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name))]
    async fn list_settings(&self) -> Result<Vec<setting::Model>, StoreError> {
        let sql = format!("{SELECT_SETTINGS} ORDER BY key ASC");

        Setting::find()
            .from_raw_sql(self.statement(&sql, vec![self.name_value()]))
            .all(&*self.db)
            .await
            .map_err(StoreError::from_db)
    }

    #[instrument(skip_all, fields(integration = %self.integration_name, key = %key))]
    async fn delete_setting(&self, key: &str) -> Result<bool, StoreError> {
        let result = self
            .execute(DELETE_SETTING, vec![self.name_value(), key.into()])
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
