//! Structured task group driving the process lifecycle.
//!
//! Every listener and the ingestion loop run as a [`ManagedTask`] inside one
//! `JoinSet`. The coordinator waits for the external token, an OS signal or
//! the first failing task, then cancels the shared token and joins every task
//! before returning. The first failure wins.

use std::collections::HashMap;
use std::future::Future;

use actix_web::web;
use async_trait::async_trait;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::IngestionError;
use crate::inbound::http::health::HealthState;

/// Failure reported by a managed task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("listener failed: {0}")]
    Listener(#[from] std::io::Error),
    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),
}

/// Failure of the task group as a whole.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("task {task} failed: {message}")]
    TaskFailed { task: String, message: String },
    #[error("task {task} panicked")]
    TaskPanicked { task: String },
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(String),
}

/// Long-running unit of work owned by the coordinator.
///
/// Implementations must return promptly once `token` is cancelled. Returning
/// `Ok` before cancellation ends only that task; returning `Err` shuts the
/// whole group down.
#[async_trait]
pub trait ManagedTask: Send + 'static {
    /// Stable label used in logs and lifecycle errors.
    fn name(&self) -> &str;

    /// Drive the task until it finishes or `token` is cancelled.
    async fn run(self: Box<Self>, token: CancellationToken) -> Result<(), TaskError>;
}

/// Starts managed tasks together and stops them together.
#[derive(Default)]
pub struct LifecycleCoordinator {
    tasks: Vec<Box<dyn ManagedTask>>,
    health: Option<web::Data<HealthState>>,
}

impl LifecycleCoordinator {
    /// Coordinator with no tasks and no health reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; tasks start in registration order.
    pub fn with_task(mut self, task: Box<dyn ManagedTask>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Report readiness once tasks are spawned and unhealthiness on shutdown.
    pub fn with_health(mut self, health: web::Data<HealthState>) -> Self {
        self.health = Some(health);
        self
    }

    /// Names of the registered tasks.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name()).collect()
    }

    /// Run every task until shutdown and return the first failure, if any.
    ///
    /// Shutdown starts when `token` is cancelled, when `shutdown_signal`
    /// resolves, or when a task fails. Returns only after every task exited.
    pub async fn run<S>(
        self,
        token: CancellationToken,
        shutdown_signal: S,
    ) -> Result<(), LifecycleError>
    where
        S: Future<Output = std::io::Result<()>> + Send,
    {
        let Self { tasks, health } = self;
        let mut set = JoinSet::new();
        let mut names = HashMap::new();
        for task in tasks {
            let name = task.name().to_owned();
            let child = token.child_token();
            let handle = set.spawn(async move { task.run(child).await });
            info!(task = %name, "task started");
            names.insert(handle.id(), name);
        }
        if let Some(health) = &health {
            health.mark_ready();
        }

        let mut first_error = None;
        tokio::pin!(shutdown_signal);
        loop {
            tokio::select! {
                () = token.cancelled() => {
                    info!("shutdown requested by cancellation");
                    break;
                }
                signal = &mut shutdown_signal => {
                    match signal {
                        Ok(()) => info!("shutdown requested by signal"),
                        Err(err) => {
                            error!(error = %err, "signal listener failed");
                            first_error = Some(LifecycleError::Signal(err.to_string()));
                        }
                    }
                    break;
                }
                Some(joined) = set.join_next_with_id() => {
                    if let Err(err) = outcome(joined, &names) {
                        error!(error = %err, "task failed; shutting down");
                        first_error = Some(err);
                        break;
                    }
                }
            }
        }

        if let Some(health) = &health {
            health.mark_unhealthy();
        }
        token.cancel();
        while let Some(joined) = set.join_next_with_id().await {
            if let Err(err) = outcome(joined, &names) {
                warn!(error = %err, "task failed during shutdown");
                first_error.get_or_insert(err);
            }
        }
        info!("all tasks stopped");

        first_error.map_or(Ok(()), Err)
    }
}

fn outcome(
    joined: Result<(tokio::task::Id, Result<(), TaskError>), JoinError>,
    names: &HashMap<tokio::task::Id, String>,
) -> Result<(), LifecycleError> {
    let name_of = |id: tokio::task::Id| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_owned())
    };
    match joined {
        Ok((id, Ok(()))) => {
            info!(task = %name_of(id), "task finished");
            Ok(())
        }
        Ok((id, Err(err))) => Err(LifecycleError::TaskFailed {
            task: name_of(id),
            message: err.to_string(),
        }),
        Err(join_err) => Err(LifecycleError::TaskPanicked {
            task: name_of(join_err.id()),
        }),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
