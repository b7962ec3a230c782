//! Database migrations for the integration store.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_03_01_000001_create_integrations;
mod m2024_03_01_000002_create_integrations_data;
mod m2024_03_01_000003_create_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_03_01_000001_create_integrations::Migration),
            Box::new(m2024_03_01_000002_create_integrations_data::Migration),
            Box::new(m2024_03_01_000003_create_settings::Migration),
        ]
    }
}
