//! Pool bootstrap, migrations and store selection.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{AppConfig, StoreBackend};
use crate::error::StoreError;
use crate::repositories::{IntegrationStore, OrmIntegrationStore, SqlIntegrationStore};

/// Errors that can occur while bootstrapping the pool.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

const CONNECT_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

fn connect_options(cfg: &AppConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    opt
}

/// Connects the store pool, retrying with doubling backoff.
///
/// ```no_run
/// use integration_store::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let db = init_pool(&AppConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.trim().is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let opt = connect_options(cfg);
    let mut delay = INITIAL_BACKOFF;
    let mut attempt = 1;

    loop {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                tracing::info!(
                    attempt,
                    backend = ?conn.get_database_backend(),
                    "Store pool connected"
                );
                return Ok(conn);
            }
            Err(source) if attempt >= CONNECT_ATTEMPTS => {
                tracing::error!(
                    attempts = attempt,
                    error = %source,
                    "Giving up on store database"
                );
                return Err(DatabaseError::ConnectionFailed { source }.into());
            }
            Err(err) => {
                tracing::warn!(
                    attempt,
                    error = %err,
                    retry_in = ?delay,
                    "Store database unreachable"
                );
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Applies all pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Verifies that the pool can still serve a query.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}

/// Opens the configured store implementation for `integration_name`.
pub fn open_store(
    db: Arc<DatabaseConnection>,
    integration_name: &str,
    backend: StoreBackend,
) -> Result<Arc<dyn IntegrationStore>, StoreError> {
    let store: Arc<dyn IntegrationStore> = match backend {
        StoreBackend::Orm => Arc::new(OrmIntegrationStore::new(db, integration_name)?),
        StoreBackend::Sql => Arc::new(SqlIntegrationStore::new(db, integration_name)?),
    };
    Ok(store)
}
