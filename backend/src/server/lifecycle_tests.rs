//! Tests for the lifecycle coordinator using scripted tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rstest::rstest;
use tokio::time::{Instant, sleep};

use super::*;
use crate::domain::ports::EventSourceError;

/// Waits for cancellation and records that it observed it.
struct WaitingTask {
    name: &'static str,
    stopped: Arc<AtomicBool>,
}

impl WaitingTask {
    fn boxed(name: &'static str) -> (Box<dyn ManagedTask>, Arc<AtomicBool>) {
        let stopped = Arc::new(AtomicBool::new(false));
        let task = Self {
            name,
            stopped: Arc::clone(&stopped),
        };
        (Box::new(task), stopped)
    }
}

#[async_trait]
impl ManagedTask for WaitingTask {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(self: Box<Self>, token: CancellationToken) -> Result<(), TaskError> {
        token.cancelled().await;
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

enum Script {
    Finish,
    Fail,
    Panic,
}

/// Performs its script after a delay, ignoring cancellation.
struct ScriptedTask {
    name: &'static str,
    after: Duration,
    script: Script,
}

#[async_trait]
impl ManagedTask for ScriptedTask {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(self: Box<Self>, _token: CancellationToken) -> Result<(), TaskError> {
        sleep(self.after).await;
        match self.script {
            Script::Finish => Ok(()),
            Script::Fail => Err(TaskError::Ingestion(IngestionError::Source(
                EventSourceError::receive("broker gone"),
            ))),
            Script::Panic => panic!("scripted panic"),
        }
    }
}

fn scripted(name: &'static str, after_ms: u64, script: Script) -> Box<dyn ManagedTask> {
    Box::new(ScriptedTask {
        name,
        after: Duration::from_millis(after_ms),
        script,
    })
}

fn cancel_after(token: &CancellationToken, after: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        sleep(after).await;
        token.cancel();
    });
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cancellation_stops_every_task() {
    let (api, api_stopped) = WaitingTask::boxed("api");
    let (ingestion, ingestion_stopped) = WaitingTask::boxed("ingestion");
    let coordinator = LifecycleCoordinator::new().with_task(api).with_task(ingestion);
    assert_eq!(coordinator.task_names(), vec!["api", "ingestion"]);
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_millis(20));

    coordinator
        .run(token, std::future::pending())
        .await
        .expect("clean shutdown");

    assert!(api_stopped.load(Ordering::SeqCst));
    assert!(ingestion_stopped.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn signal_triggers_shutdown() {
    let (api, api_stopped) = WaitingTask::boxed("api");
    let token = CancellationToken::new();
    let signal = async {
        sleep(Duration::from_millis(30)).await;
        Ok(())
    };

    LifecycleCoordinator::new()
        .with_task(api)
        .run(token.clone(), signal)
        .await
        .expect("clean shutdown");

    assert!(api_stopped.load(Ordering::SeqCst));
    assert!(token.is_cancelled());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn first_failure_cancels_siblings_and_is_returned() {
    let (api, api_stopped) = WaitingTask::boxed("api");
    let coordinator = LifecycleCoordinator::new()
        .with_task(api)
        .with_task(scripted("ingestion", 10, Script::Fail))
        .with_task(scripted("late", 500, Script::Fail));

    let err = coordinator
        .run(CancellationToken::new(), std::future::pending())
        .await
        .expect_err("failure propagates");

    match err {
        LifecycleError::TaskFailed { task, message } => {
            assert_eq!(task, "ingestion");
            assert!(message.contains("broker gone"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(api_stopped.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn panics_are_reported_by_task_name() {
    let (api, _) = WaitingTask::boxed("api");

    let err = LifecycleCoordinator::new()
        .with_task(api)
        .with_task(scripted("docs", 5, Script::Panic))
        .run(CancellationToken::new(), std::future::pending())
        .await
        .expect_err("panic propagates");

    assert!(matches!(err, LifecycleError::TaskPanicked { task } if task == "docs"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn early_clean_exit_does_not_stop_siblings() {
    let (api, api_stopped) = WaitingTask::boxed("api");
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_millis(100));
    let started = Instant::now();

    LifecycleCoordinator::new()
        .with_task(api)
        .with_task(scripted("ingestion", 1, Script::Finish))
        .run(token, std::future::pending())
        .await
        .expect("clean shutdown");

    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(api_stopped.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn signal_listener_failure_is_an_error() {
    let (api, api_stopped) = WaitingTask::boxed("api");
    let signal = async { Err(std::io::Error::other("no signal support")) };

    let err = LifecycleCoordinator::new()
        .with_task(api)
        .run(CancellationToken::new(), signal)
        .await
        .expect_err("signal failure propagates");

    assert!(matches!(err, LifecycleError::Signal(_)));
    assert!(api_stopped.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn health_tracks_the_lifecycle() {
    let health = web::Data::new(HealthState::new());
    let (api, _) = WaitingTask::boxed("api");
    let token = CancellationToken::new();
    let coordinator = LifecycleCoordinator::new()
        .with_task(api)
        .with_health(health.clone());

    let observed = health.clone();
    let watcher = tokio::spawn({
        let token = token.clone();
        async move {
            sleep(Duration::from_millis(10)).await;
            let ready = observed.is_ready();
            token.cancel();
            ready
        }
    });

    coordinator
        .run(token, std::future::pending())
        .await
        .expect("clean shutdown");

    assert!(watcher.await.expect("watcher task"));
    assert!(!health.is_ready());
    assert!(!health.is_alive());
}
