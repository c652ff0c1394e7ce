//! Ingestion and process lifecycle wired together over in-memory adapters.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth_backend::domain::ports::UserManagement;
use auth_backend::domain::{GetUserParams, UserId, UserService};
use auth_backend::outbound::cache::InMemoryUserCache;
use auth_backend::outbound::events::ChannelEventSource;
use auth_backend::server::{
    IngestionTask, LifecycleCoordinator, LifecycleError, ManagedTask, ServiceGraph,
    ServiceSettings,
};
use auth_backend::test_support::InMemoryUserStore;
use rstest::rstest;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn local_settings() -> ServiceSettings {
    ServiceSettings {
        database_url: None,
        db_max_connections: 1,
        redis_url: None,
        http_bind: Some("127.0.0.1:0".to_owned()),
        docs_bind: Some("127.0.0.1:0".to_owned()),
        kafka_brokers: None,
        kafka_group_id: None,
        kafka_topic: None,
        shutdown_timeout_secs: 1,
    }
}

#[rstest]
#[tokio::test]
async fn ingested_users_are_read_from_the_store_first() {
    let store = Arc::new(InMemoryUserStore::new());
    let cache = Arc::new(InMemoryUserCache::new());
    let service = UserService::new(Arc::clone(&store), Arc::clone(&cache));
    let (publisher, source) = ChannelEventSource::new(8);
    let source = Arc::new(source);
    let task: Box<dyn ManagedTask> =
        Box::new(IngestionTask::new(Arc::clone(&store), Arc::clone(&source)));
    let token = CancellationToken::new();
    let running = tokio::spawn(
        LifecycleCoordinator::new()
            .with_task(task)
            .run(token.clone(), std::future::pending()),
    );

    let payload = json!({ "name": "Bob", "email": "bob@x.com", "password": "$argon2id$bob", "role": 1 });
    let offset = publisher
        .publish(payload.to_string().into_bytes())
        .await
        .expect("publish");
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.committed_offset() != Some(offset) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("event consumed");

    assert!(cache.is_empty().await, "ingestion does not warm the cache");
    assert!(store.audit_entries().await.is_empty(), "ingestion is not audited");

    let id = UserId::new(1).expect("first assigned id");
    let reads = store.read_count();
    let first = service
        .get(GetUserParams { user_id: id })
        .await
        .expect("ingested user");
    assert_eq!(first.email(), "bob@x.com");
    assert_eq!(store.read_count(), reads + 1, "first read goes to the store");

    service
        .get(GetUserParams { user_id: id })
        .await
        .expect("cached user");
    assert_eq!(store.read_count(), reads + 1, "second read is a cache hit");

    token.cancel();
    running
        .await
        .expect("coordinator joined")
        .expect("clean shutdown");
}

#[rstest]
#[actix_web::test]
async fn listeners_and_ingestion_stop_on_cancellation() {
    let store = Arc::new(InMemoryUserStore::new());
    let users: Arc<dyn UserManagement> = Arc::new(UserService::new(
        Arc::clone(&store),
        Arc::new(InMemoryUserCache::new()),
    ));
    let (_publisher, source) = ChannelEventSource::new(1);
    let ingestion: Box<dyn ManagedTask> = Box::new(IngestionTask::new(store, Arc::new(source)));
    let graph = ServiceGraph::from_parts(users, Some(ingestion));
    let health = graph.health.clone();

    let coordinator = graph
        .into_coordinator(&local_settings())
        .expect("listeners bind");
    assert_eq!(coordinator.task_names(), vec!["api", "docs", "ingestion"]);

    let token = CancellationToken::new();
    let canceller = token.clone();
    let stopper = async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    };
    let (result, ()) = tokio::join!(coordinator.run(token, std::future::pending()), stopper);

    result.expect("clean shutdown");
    assert!(!health.is_ready());
}

#[rstest]
#[actix_web::test]
async fn occupied_port_fails_startup() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").expect("reserve port");
    let addr: SocketAddr = occupied.local_addr().expect("addr");
    let mut settings = local_settings();
    settings.http_bind = Some(addr.to_string());
    settings.docs_bind = None;
    let store = Arc::new(InMemoryUserStore::new());
    let users: Arc<dyn UserManagement> = Arc::new(UserService::new(
        store,
        Arc::new(InMemoryUserCache::new()),
    ));

    let err = ServiceGraph::from_parts(users, None)
        .into_coordinator(&settings)
        .err()
        .expect("bind must fail");

    assert!(err.to_string().contains("api"), "unexpected error: {err}");
}

#[rstest]
#[tokio::test]
async fn fatal_ingestion_error_stops_the_process() {
    let store = Arc::new(InMemoryUserStore::new());
    let (publisher, source) = ChannelEventSource::new(1);
    let ingestion: Box<dyn ManagedTask> = Box::new(IngestionTask::new(store, Arc::new(source)));
    publisher
        .publish(b"{not json".to_vec())
        .await
        .expect("publish");

    let err = LifecycleCoordinator::new()
        .with_task(ingestion)
        .run(CancellationToken::new(), std::future::pending())
        .await
        .expect_err("malformed event is fatal");

    assert!(matches!(err, LifecycleError::TaskFailed { ref task, .. } if task == "ingestion"));
}
