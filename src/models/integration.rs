//! Integration entity model
//!
//! This module contains the SeaORM entity model for the integrations table,
//! which stores the OAuth client credentials and token state of a single
//! named integration.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::fmt;

/// Integration entity; at most one row per `integration_name`
#[derive(Clone, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "integrations")]
pub struct Model {
    /// Surrogate primary key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Name the integration is addressed by (unique)
    #[sea_orm(unique)]
    pub integration_name: String,

    /// Account identifier on the remote side
    pub account_id: Option<i64>,

    /// Account subdomain on the remote side
    pub subdomain: Option<String>,

    /// OAuth client id
    pub client_id: Option<String>,

    /// OAuth client secret
    pub client_secret: Option<String>,

    /// OAuth redirect URI registered for the client
    pub redirect_uri: Option<String>,

    /// Unix seconds of the last query made against the remote API
    pub last_query_at: Option<i64>,

    /// Current refresh token
    pub refresh_token: Option<String>,

    /// Current access token
    pub access_token: Option<String>,

    /// Unix seconds at which the access token expires
    pub expire_access_token: Option<i64>,

    /// Unix seconds at which the refresh token expires
    pub expire_refresh_token: Option<i64>,

    /// Queries still available in the free quota
    pub free_query: Option<i64>,

    /// Query limit per window
    pub limit_query: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn redact<T>(value: &Option<T>) -> &'static str {
    if value.is_some() { "[REDACTED]" } else { "None" }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("integration_name", &self.integration_name)
            .field("account_id", &self.account_id)
            .field("subdomain", &self.subdomain)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .field("last_query_at", &self.last_query_at)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .field("expire_access_token", &self.expire_access_token)
            .field("expire_refresh_token", &self.expire_refresh_token)
            .field("free_query", &self.free_query)
            .field("limit_query", &self.limit_query)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let model = Model {
            id: 1,
            integration_name: "acme".to_string(),
            account_id: Some(42),
            subdomain: Some("acme".to_string()),
            client_id: Some("cid1".to_string()),
            client_secret: Some("sec1".to_string()),
            redirect_uri: None,
            last_query_at: None,
            refresh_token: Some("refresh-value".to_string()),
            access_token: Some("access-value".to_string()),
            expire_access_token: Some(1_700_000_000),
            expire_refresh_token: None,
            free_query: None,
            limit_query: Some(5),
        };

        let rendered = format!("{:?}", model);
        assert!(rendered.contains("cid1"));
        assert!(!rendered.contains("sec1"));
        assert!(!rendered.contains("refresh-value"));
        assert!(!rendered.contains("access-value"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
