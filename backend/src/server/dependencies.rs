//! Explicit dependency graph for the service.
//!
//! Construction runs in dependency order and fails fast:
//!
//! ```text
//! settings -> db pool (ping) -> cache (ping) -> user store -> user service
//!          -> http state -> listeners (bind) -> ingestion (subscribe)
//! ```
//!
//! Nothing here is global; every component receives what it needs as an
//! argument, so tests can assemble the same graph from in-memory adapters.

use std::sync::Arc;

use actix_web::web;
use tracing::{info, warn};

use crate::domain::UserService;
use crate::domain::ports::{EventSourceError, UserCache, UserCacheError, UserManagement};
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::{InMemoryUserCache, RedisUserCache};
use crate::outbound::persistence::{DbPool, DieselUserStore, PoolConfig, PoolError};

use super::app::{AppDependencies, create_api_server, create_docs_server};
use super::config::{ServiceSettings, SettingsError};
use super::lifecycle::{LifecycleCoordinator, ManagedTask};
use super::listener::HttpListener;

/// Failure while building the dependency graph.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("database unavailable: {0}")]
    Database(#[from] PoolError),
    #[error("cache unavailable: {0}")]
    Cache(#[from] UserCacheError),
    #[error("event source unavailable: {0}")]
    Broker(#[from] EventSourceError),
    #[error("failed to bind {listener} listener: {source}")]
    Bind {
        listener: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Fully wired service components, ready to be handed to the coordinator.
pub struct ServiceGraph {
    pub health: web::Data<HealthState>,
    pub users: Arc<dyn UserManagement>,
    pub ingestion: Option<Box<dyn ManagedTask>>,
}

impl ServiceGraph {
    /// Assemble a graph from already constructed components.
    pub fn from_parts(
        users: Arc<dyn UserManagement>,
        ingestion: Option<Box<dyn ManagedTask>>,
    ) -> Self {
        Self {
            health: web::Data::new(HealthState::new()),
            users,
            ingestion,
        }
    }

    /// Connect to every external dependency named by `settings`.
    ///
    /// # Errors
    /// Returns the first dependency that cannot be configured or reached.
    pub async fn connect(settings: &ServiceSettings) -> Result<Self, StartupError> {
        let pool_config = PoolConfig::new(settings.database_url()?)
            .with_max_size(settings.db_max_connections);
        let pool = DbPool::new(pool_config).await?;
        pool.ping().await?;
        info!("database reachable");

        let cache = build_cache(settings).await?;
        let store = Arc::new(DieselUserStore::new(pool));
        let users: Arc<dyn UserManagement> =
            Arc::new(UserService::new(Arc::clone(&store), cache));
        let ingestion = build_ingestion(settings, store)?;

        Ok(Self::from_parts(users, ingestion))
    }

    /// Bind the listeners and register every task with a coordinator.
    ///
    /// # Errors
    /// Returns [`StartupError::Bind`] when a listener address is unavailable.
    pub fn into_coordinator(
        self,
        settings: &ServiceSettings,
    ) -> Result<LifecycleCoordinator, StartupError> {
        let Self {
            health,
            users,
            ingestion,
        } = self;
        let shutdown_timeout = settings.shutdown_timeout();

        let http_bind = settings.http_bind()?;
        let deps = AppDependencies {
            health_state: health.clone(),
            http_state: web::Data::new(HttpState::new(users)),
        };
        let api = create_api_server(deps, http_bind, shutdown_timeout).map_err(|source| {
            StartupError::Bind {
                listener: "api",
                source,
            }
        })?;
        info!(%http_bind, "api listener bound");

        let mut coordinator = LifecycleCoordinator::new()
            .with_health(health)
            .with_task(Box::new(HttpListener::new("api", api, shutdown_timeout)));

        if let Some(docs_bind) = settings.docs_bind()? {
            let docs = create_docs_server(docs_bind, shutdown_timeout).map_err(|source| {
                StartupError::Bind {
                    listener: "docs",
                    source,
                }
            })?;
            info!(%docs_bind, "docs listener bound");
            coordinator =
                coordinator.with_task(Box::new(HttpListener::new("docs", docs, shutdown_timeout)));
        }

        if let Some(task) = ingestion {
            coordinator = coordinator.with_task(task);
        }
        Ok(coordinator)
    }
}

async fn build_cache(settings: &ServiceSettings) -> Result<Arc<dyn UserCache>, StartupError> {
    match settings.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisUserCache::connect(url, settings.db_max_connections).await?;
            cache.ping().await?;
            info!("redis reachable");
            Ok(Arc::new(cache))
        }
        None => {
            warn!("no redis url configured; using in-process cache");
            Ok(Arc::new(InMemoryUserCache::new()))
        }
    }
}

#[cfg(feature = "kafka")]
fn build_ingestion(
    settings: &ServiceSettings,
    store: Arc<DieselUserStore>,
) -> Result<Option<Box<dyn ManagedTask>>, StartupError> {
    use super::listener::IngestionTask;
    use crate::outbound::events::KafkaEventSource;

    let Some(source_config) = settings.kafka_source() else {
        info!("no kafka brokers configured; ingestion disabled");
        return Ok(None);
    };
    let source = Arc::new(KafkaEventSource::subscribe(&source_config)?);
    Ok(Some(Box::new(IngestionTask::new(store, source))))
}

#[cfg(not(feature = "kafka"))]
fn build_ingestion(
    settings: &ServiceSettings,
    _store: Arc<DieselUserStore>,
) -> Result<Option<Box<dyn ManagedTask>>, StartupError> {
    if settings.kafka_source().is_some() {
        warn!("kafka brokers configured but the kafka feature is disabled; ingestion disabled");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::MockUserManagement;

    fn settings(http_bind: &str, docs_bind: Option<&str>) -> ServiceSettings {
        ServiceSettings {
            database_url: None,
            db_max_connections: 1,
            redis_url: None,
            http_bind: Some(http_bind.to_owned()),
            docs_bind: docs_bind.map(str::to_owned),
            kafka_brokers: None,
            kafka_group_id: None,
            kafka_topic: None,
            shutdown_timeout_secs: 1,
        }
    }

    fn graph() -> ServiceGraph {
        ServiceGraph::from_parts(Arc::new(MockUserManagement::new()), None)
    }

    #[rstest]
    #[tokio::test]
    async fn missing_database_url_fails_before_any_connection() {
        let err = ServiceGraph::connect(&settings("127.0.0.1:0", None))
            .await
            .err()
            .expect("startup must fail");

        assert!(matches!(
            err,
            StartupError::Settings(SettingsError::MissingDatabaseUrl)
        ));
    }

    #[rstest]
    #[case(None, vec!["api"])]
    #[case(Some("127.0.0.1:0"), vec!["api", "docs"])]
    #[actix_web::test]
    async fn listeners_are_registered(
        #[case] docs_bind: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let coordinator = graph()
            .into_coordinator(&settings("127.0.0.1:0", docs_bind))
            .expect("listeners bind");

        assert_eq!(coordinator.task_names(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn invalid_docs_bind_is_rejected() {
        let err = graph()
            .into_coordinator(&settings("127.0.0.1:0", Some("nowhere")))
            .err()
            .expect("invalid address");

        assert!(matches!(
            err,
            StartupError::Settings(SettingsError::InvalidBindAddress { field: "docs_bind", .. })
        ));
    }
}
