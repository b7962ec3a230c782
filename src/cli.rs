//! Command-line surface over [`IntegrationStore`].
//!
//! Every command prints a single JSON document on stdout; logs go to stderr.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::repositories::{IntegrationStore, IntegrationUpsert, SortDirection};

#[derive(Debug, Parser)]
#[command(name = "integration-store", version, about = "Inspect and edit stored integrations")]
pub struct Cli {
    /// Integration to operate on (defaults to INTEGRATION_STORE_INTEGRATION_NAME)
    #[arg(short, long, global = true)]
    pub integration: Option<String>,

    /// Override INTEGRATION_STORE_DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Store implementation: orm or sql
    #[arg(long, global = true)]
    pub backend: Option<StoreBackend>,

    /// Apply pending migrations before running the command
    #[arg(long, global = true)]
    pub migrate: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending migrations
    Migrate,
    /// Check that the database answers
    Health,
    /// Store client credentials unless the integration already exists
    Secrets {
        client_id: String,
        client_secret: String,
    },
    /// Insert or overwrite the integration from a JSON document
    Upsert {
        /// JSON object with the integration fields
        json: String,
    },
    /// Print the integration
    Show,
    /// Delete the integration
    Delete,
    /// Data point commands
    #[command(subcommand)]
    Data(DataCommand),
    /// Setting commands
    #[command(subcommand)]
    Setting(SettingCommand),
}

#[derive(Debug, Subcommand)]
pub enum DataCommand {
    Add { data_name: String, data: String },
    Latest(LatestArgs),
    List { data_name: String },
    Delete { id: i32 },
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    pub data_name: String,
    /// asc returns the oldest point, desc the newest
    #[arg(long, default_value = "asc")]
    pub direction: SortDirection,
}

#[derive(Debug, Subcommand)]
pub enum SettingCommand {
    Get { key: String },
    Set { key: String, value: String },
    Delete { key: String },
    List,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(backend) = self.backend {
            config.store_backend = backend;
        }
        if let Some(name) = &self.integration {
            config.integration_name = Some(name.clone());
        }
        if self.migrate {
            config.auto_migrate = true;
        }
        config.validate().context("invalid configuration")?;
        Ok(())
    }
}

/// Executes the parsed command against the configured database.
pub async fn run(cli: Cli, config: &AppConfig) -> Result<Value> {
    let db = Arc::new(
        db::init_pool(config)
            .await
            .context("initializing database connection pool")?,
    );

    if config.auto_migrate || matches!(cli.command, Command::Migrate) {
        db::run_migrations(&db).await?;
    }

    match cli.command {
        Command::Migrate => return Ok(json!({ "migrated": true })),
        Command::Health => {
            db::health_check(&db).await?;
            return Ok(json!({ "healthy": true }));
        }
        _ => {}
    }

    let name = config
        .integration_name
        .as_deref()
        .ok_or_else(|| anyhow!("no integration selected; pass --integration or set INTEGRATION_STORE_INTEGRATION_NAME"))?;
    let store = db::open_store(db, name, config.store_backend)?;

    execute(store.as_ref(), cli.command).await
}

async fn execute(store: &dyn IntegrationStore, command: Command) -> Result<Value> {
    let output = match command {
        Command::Migrate | Command::Health => bail!("migrate and health do not operate on a store"),
        Command::Secrets {
            client_id,
            client_secret,
        } => {
            let created = store.add_secrets(&client_id, &client_secret).await?;
            json!({ "created": created })
        }
        Command::Upsert { json } => {
            let fields: IntegrationUpsert =
                serde_json::from_str(&json).context("parsing integration JSON")?;
            let outcome = store.upsert_integration(&fields).await?;
            json!({ "outcome": outcome })
        }
        Command::Show => serde_json::to_value(store.get_integration().await?)?,
        Command::Delete => json!({ "deleted": store.delete_integration().await? }),
        Command::Data(DataCommand::Add { data_name, data }) => {
            serde_json::to_value(store.add_data_point(&data_name, &data).await?)?
        }
        Command::Data(DataCommand::Latest(args)) => serde_json::to_value(
            store
                .get_latest_data_point(&args.data_name, args.direction)
                .await?,
        )?,
        Command::Data(DataCommand::List { data_name }) => {
            serde_json::to_value(store.get_data_points(&data_name).await?)?
        }
        Command::Data(DataCommand::Delete { id }) => {
            json!({ "deleted": store.delete_data_point(id).await? })
        }
        Command::Setting(SettingCommand::Get { key }) => {
            serde_json::to_value(store.get_setting(&key).await?)?
        }
        Command::Setting(SettingCommand::Set { key, value }) => {
            store.set_setting(&key, &value).await?;
            json!({ "key": key, "value": value })
        }
        Command::Setting(SettingCommand::Delete { key }) => {
            json!({ "deleted": store.delete_setting(&key).await? })
        }
        Command::Setting(SettingCommand::List) => {
            serde_json::to_value(store.list_settings().await?)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Default::default()
        }
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "integration-store",
            "data",
            "latest",
            "leads",
            "--direction",
            "desc",
            "--integration",
            "acme",
            "--backend",
            "sql",
        ])
        .unwrap();

        assert_eq!(cli.integration.as_deref(), Some("acme"));
        assert_eq!(cli.backend, Some(StoreBackend::Sql));
        match cli.command {
            Command::Data(DataCommand::Latest(args)) => {
                assert_eq!(args.data_name, "leads");
                assert_eq!(args.direction, SortDirection::Desc);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn overrides_win_over_loaded_config() {
        let cli = Cli::try_parse_from([
            "integration-store",
            "--integration",
            "acme",
            "--migrate",
            "--database-url",
            "sqlite::memory:",
            "show",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config).unwrap();

        assert_eq!(config.integration_name.as_deref(), Some("acme"));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.auto_migrate);
    }

    #[tokio::test]
    async fn store_commands_require_an_integration() {
        let cli = Cli::try_parse_from(["integration-store", "--migrate", "show"]).unwrap();
        let mut config = memory_config();
        cli.apply_overrides(&mut config).unwrap();

        let err = run(cli, &config).await.unwrap_err();
        assert!(err.to_string().contains("no integration selected"));
    }

    #[tokio::test]
    async fn secrets_then_show_round_trip() {
        let config = AppConfig {
            integration_name: Some("acme".to_string()),
            ..memory_config()
        };
        let db = Arc::new(db::init_pool(&config).await.unwrap());
        db::run_migrations(&db).await.unwrap();
        let store = db::open_store(db, "acme", StoreBackend::Orm).unwrap();

        let created = execute(
            store.as_ref(),
            Command::Secrets {
                client_id: "cid1".to_string(),
                client_secret: "sec1".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created, json!({ "created": true }));

        let shown = execute(store.as_ref(), Command::Show).await.unwrap();
        assert_eq!(shown["client_id"], "cid1");
        assert_eq!(shown["integration_name"], "acme");
    }
}
