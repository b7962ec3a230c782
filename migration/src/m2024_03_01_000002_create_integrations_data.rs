//! Migration to create the integrations_data table.
//!
//! Append-only log of named payloads per integration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IntegrationsData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IntegrationsData::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IntegrationsData::IntegrationName)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IntegrationsData::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(IntegrationsData::DataName).text().not_null())
                    .col(ColumnDef::new(IntegrationsData::Data).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_integrations_data_name_created_at")
                    .table(IntegrationsData::Table)
                    .col(IntegrationsData::IntegrationName)
                    .col(IntegrationsData::DataName)
                    .col(IntegrationsData::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_integrations_data_name_created_at")
                    .table(IntegrationsData::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(IntegrationsData::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IntegrationsData {
    Table,
    Id,
    IntegrationName,
    CreatedAt,
    DataName,
    Data,
}
