//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `AUTH_*` environment variables, an optional config file
//! and command-line flags, in increasing order of precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::events::KafkaSourceConfig;

const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8080";
const DEFAULT_KAFKA_GROUP_ID: &str = "auth-backend";
const DEFAULT_KAFKA_TOPIC: &str = "users.creation";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("database URL is required (set AUTH_DATABASE_URL or --database-url)")]
    MissingDatabaseUrl,
    #[error("{field} is not a socket address: {value}")]
    InvalidBindAddress { field: &'static str, value: String },
}

/// Runtime settings for the service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "AUTH")]
pub struct ServiceSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Redis URL; absent selects the in-process cache.
    pub redis_url: Option<String>,
    /// Address for the API listener.
    pub http_bind: Option<String>,
    /// Address for the documentation listener; absent disables it.
    pub docs_bind: Option<String>,
    /// Comma-separated Kafka brokers; absent disables ingestion.
    pub kafka_brokers: Option<String>,
    pub kafka_group_id: Option<String>,
    pub kafka_topic: Option<String>,
    /// Grace period for in-flight requests during shutdown.
    #[ortho_config(default = 10)]
    pub shutdown_timeout_secs: u64,
}

impl ServiceSettings {
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn http_bind(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.http_bind.as_deref().unwrap_or(DEFAULT_HTTP_BIND);
        parse_bind("http_bind", raw)
    }

    /// Documentation listener address, if one is configured.
    pub fn docs_bind(&self) -> Result<Option<SocketAddr>, SettingsError> {
        self.docs_bind
            .as_deref()
            .map(|raw| parse_bind("docs_bind", raw))
            .transpose()
    }

    /// Broker subscription, if brokers are configured.
    pub fn kafka_source(&self) -> Option<KafkaSourceConfig> {
        let brokers = self
            .kafka_brokers
            .as_deref()
            .filter(|brokers| !brokers.trim().is_empty())?;
        Some(KafkaSourceConfig {
            brokers: brokers.to_owned(),
            group_id: self
                .kafka_group_id
                .clone()
                .unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.to_owned()),
            topic: self
                .kafka_topic
                .clone()
                .unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_owned()),
        })
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_bind(field: &'static str, raw: &str) -> Result<SocketAddr, SettingsError> {
    raw.trim()
        .parse()
        .map_err(|_| SettingsError::InvalidBindAddress {
            field,
            value: raw.to_owned(),
        })
}
