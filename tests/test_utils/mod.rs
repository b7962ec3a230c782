//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations applied, and for opening both store implementations over
//! the same pool.

use anyhow::Result;
use integration_store::config::{AppConfig, StoreBackend};
use integration_store::db::{self, open_store};
use integration_store::models::integration;
use integration_store::repositories::{IntegrationStore, IntegrationUpsert};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::sync::Arc;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is capped at one connection so every statement sees the same
/// in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Migrated SQLite database in `dir` behind a pool of `max_connections`, so
/// concurrent callers really hold separate connections.
#[allow(dead_code)]
pub async fn setup_file_db(
    dir: &Path,
    max_connections: u32,
) -> Result<Arc<DatabaseConnection>> {
    let config = AppConfig {
        database_url: format!("sqlite://{}?mode=rwc", dir.join("store.db").display()),
        db_max_connections: max_connections,
        ..Default::default()
    };
    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;
    Ok(Arc::new(db))
}

/// Both store implementations, each paired with a label for assertion messages.
#[allow(dead_code)]
pub const BACKENDS: [(StoreBackend, &str); 2] =
    [(StoreBackend::Orm, "orm"), (StoreBackend::Sql, "sql")];

/// Opens a store for `name` on a fresh migrated database.
#[allow(dead_code)]
pub async fn fresh_store(
    backend: StoreBackend,
    name: &str,
) -> Result<(Arc<DatabaseConnection>, Arc<dyn IntegrationStore>)> {
    let db = setup_test_db_arc().await?;
    let store = open_store(db.clone(), name, backend)?;
    Ok((db, store))
}

/// A complete upsert payload whose access token expires at `expire_access_token`.
#[allow(dead_code)]
pub fn sample_upsert(expire_access_token: i64) -> IntegrationUpsert {
    IntegrationUpsert {
        account_id: 42,
        subdomain: "acme".to_string(),
        client_id: "cid2".to_string(),
        client_secret: "sec2".to_string(),
        redirect_uri: "https://acme.example/callback".to_string(),
        last_query_at: 1_700_000_000,
        refresh_token: format!("refresh-{}", expire_access_token),
        access_token: format!("access-{}", expire_access_token),
        expire_access_token,
        expire_refresh_token: expire_access_token + 86_400,
        free_query: 100,
        limit_query: 7,
    }
}

/// Asserts that every column of `row` carries the value written by `fields`.
#[allow(dead_code)]
pub fn assert_integration_matches(
    row: &integration::Model,
    name: &str,
    fields: &IntegrationUpsert,
    label: &str,
) {
    assert_eq!(row.integration_name, name, "{label}: integration_name");
    assert_eq!(row.account_id, Some(fields.account_id), "{label}: account_id");
    assert_eq!(row.subdomain.as_deref(), Some(fields.subdomain.as_str()), "{label}: subdomain");
    assert_eq!(row.client_id.as_deref(), Some(fields.client_id.as_str()), "{label}: client_id");
    assert_eq!(
        row.client_secret.as_deref(),
        Some(fields.client_secret.as_str()),
        "{label}: client_secret"
    );
    assert_eq!(
        row.redirect_uri.as_deref(),
        Some(fields.redirect_uri.as_str()),
        "{label}: redirect_uri"
    );
    assert_eq!(row.last_query_at, Some(fields.last_query_at), "{label}: last_query_at");
    assert_eq!(
        row.refresh_token.as_deref(),
        Some(fields.refresh_token.as_str()),
        "{label}: refresh_token"
    );
    assert_eq!(
        row.access_token.as_deref(),
        Some(fields.access_token.as_str()),
        "{label}: access_token"
    );
    assert_eq!(
        row.expire_access_token,
        Some(fields.expire_access_token),
        "{label}: expire_access_token"
    );
    assert_eq!(
        row.expire_refresh_token,
        Some(fields.expire_refresh_token),
        "{label}: expire_refresh_token"
    );
    assert_eq!(row.free_query, Some(fields.free_query), "{label}: free_query");
    assert_eq!(row.limit_query, Some(fields.limit_query), "{label}: limit_query");
}
