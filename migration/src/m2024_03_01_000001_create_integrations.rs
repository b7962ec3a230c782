//! Migration to create the integrations table.
//!
//! One row per integration name holding OAuth client credentials and the
//! current token state. Expiry and query timestamps are unix seconds.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Integrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Integrations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Integrations::IntegrationName)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Integrations::AccountId).big_integer().null())
                    .col(ColumnDef::new(Integrations::Subdomain).text().null())
                    .col(ColumnDef::new(Integrations::ClientId).text().null())
                    .col(ColumnDef::new(Integrations::ClientSecret).text().null())
                    .col(ColumnDef::new(Integrations::RedirectUri).text().null())
                    .col(
                        ColumnDef::new(Integrations::LastQueryAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Integrations::RefreshToken).text().null())
                    .col(ColumnDef::new(Integrations::AccessToken).text().null())
                    .col(
                        ColumnDef::new(Integrations::ExpireAccessToken)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Integrations::ExpireRefreshToken)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Integrations::FreeQuery).big_integer().null())
                    .col(
                        ColumnDef::new(Integrations::LimitQuery)
                            .big_integer()
                            .null()
                            .default(5),
                    )
                    .to_owned(),
            )
            .await?;

        // Upserts target this index with ON CONFLICT (integration_name)
        manager
            .create_index(
                Index::create()
                    .name("idx_integrations_integration_name")
                    .table(Integrations::Table)
                    .col(Integrations::IntegrationName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_integrations_integration_name")
                    .table(Integrations::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Integrations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Integrations {
    Table,
    Id,
    IntegrationName,
    AccountId,
    Subdomain,
    ClientId,
    ClientSecret,
    RedirectUri,
    LastQueryAt,
    RefreshToken,
    AccessToken,
    ExpireAccessToken,
    ExpireRefreshToken,
    FreeQuery,
    LimitQuery,
}
