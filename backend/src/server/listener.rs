//! Managed tasks wrapping the HTTP listeners and the ingestion loop.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::Server;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::UserCreationConsumer;
use crate::domain::ports::{CreationEventSource, UserStore};

use super::lifecycle::{ManagedTask, TaskError};

/// A listener that did not drain within its grace period.
#[derive(Debug, thiserror::Error)]
#[error("{listener} did not stop within {timeout:?}")]
pub struct ShutdownError {
    pub listener: String,
    pub timeout: Duration,
}

/// Bound Actix server driven until the lifecycle token is cancelled.
pub struct HttpListener {
    name: String,
    server: Server,
    shutdown_timeout: Duration,
}

impl HttpListener {
    pub fn new(name: impl Into<String>, server: Server, shutdown_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            server,
            shutdown_timeout,
        }
    }
}

#[async_trait]
impl ManagedTask for HttpListener {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, token: CancellationToken) -> Result<(), TaskError> {
        let Self {
            name,
            server,
            shutdown_timeout,
        } = *self;
        let handle = server.handle();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                info!(listener = %name, "listener exited");
                return result.map_err(TaskError::from);
            }
            () = token.cancelled() => {}
        }

        info!(listener = %name, "stopping listener");
        // The server future must keep being polled for the stop to complete.
        let drain = async { tokio::join!(handle.stop(true), server).1 };
        match tokio::time::timeout(shutdown_timeout, drain).await {
            Ok(result) => result.map_err(TaskError::from),
            Err(_) => {
                let err = ShutdownError {
                    listener: name,
                    timeout: shutdown_timeout,
                };
                warn!(error = %err, "abandoning in-flight requests");
                Ok(())
            }
        }
    }
}

/// Ingestion loop run as a managed task.
pub struct IngestionTask<S, E> {
    consumer: UserCreationConsumer<S, E>,
}

impl<S, E> IngestionTask<S, E>
where
    S: UserStore,
    E: CreationEventSource,
{
    pub fn new(store: Arc<S>, source: Arc<E>) -> Self {
        Self {
            consumer: UserCreationConsumer::new(store, source),
        }
    }
}

#[async_trait]
impl<S, E> ManagedTask for IngestionTask<S, E>
where
    S: UserStore + 'static,
    E: CreationEventSource + 'static,
{
    fn name(&self) -> &str {
        "ingestion"
    }

    async fn run(self: Box<Self>, token: CancellationToken) -> Result<(), TaskError> {
        self.consumer.run(token).await.map_err(TaskError::from)
    }
}
