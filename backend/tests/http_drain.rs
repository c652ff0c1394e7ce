//! Graceful drain of the API listener: requests already being handled when
//! shutdown starts still get their response, and no new connections are
//! accepted once the coordinator returns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_backend::domain::ports::{UserManagement, UserServiceError};
use auth_backend::domain::{
    CreateUserParams, DeleteUserParams, GetUserParams, UpdateUserParams, User, UserService,
};
use auth_backend::outbound::cache::InMemoryUserCache;
use auth_backend::server::{ServiceGraph, ServiceSettings};
use auth_backend::test_support::{InMemoryUserStore, create_params};
use rstest::rstest;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const HANDLER_DELAY: Duration = Duration::from_millis(300);

/// Delegates to a real service but holds every read for `HANDLER_DELAY`.
struct SlowReads {
    inner: UserService<InMemoryUserStore, InMemoryUserCache>,
    entered: Arc<Notify>,
}

#[async_trait]
impl UserManagement for SlowReads {
    async fn create(&self, params: CreateUserParams) -> Result<User, UserServiceError> {
        self.inner.create(params).await
    }

    async fn get(&self, params: GetUserParams) -> Result<User, UserServiceError> {
        self.entered.notify_one();
        tokio::time::sleep(HANDLER_DELAY).await;
        self.inner.get(params).await
    }

    async fn update(&self, params: UpdateUserParams) -> Result<User, UserServiceError> {
        self.inner.update(params).await
    }

    async fn delete(&self, params: DeleteUserParams) -> Result<(), UserServiceError> {
        self.inner.delete(params).await
    }
}

fn free_local_addr() -> SocketAddr {
    let socket = std::net::TcpListener::bind("127.0.0.1:0").expect("reserve port");
    socket.local_addr().expect("local addr")
}

fn api_only_settings(addr: SocketAddr) -> ServiceSettings {
    ServiceSettings {
        database_url: None,
        db_max_connections: 1,
        redis_url: None,
        http_bind: Some(addr.to_string()),
        docs_bind: None,
        kafka_brokers: None,
        kafka_group_id: None,
        kafka_topic: None,
        shutdown_timeout_secs: 5,
    }
}

#[rstest]
#[actix_web::test]
async fn cancellation_drains_in_flight_requests_and_refuses_new_ones() {
    let inner = UserService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryUserCache::new()),
    );
    let user = inner.create(create_params("Alice")).await.expect("seed user");
    let entered = Arc::new(Notify::new());
    let users: Arc<dyn UserManagement> = Arc::new(SlowReads {
        inner,
        entered: Arc::clone(&entered),
    });

    let addr = free_local_addr();
    let coordinator = ServiceGraph::from_parts(users, None)
        .into_coordinator(&api_only_settings(addr))
        .expect("api listener binds");
    let token = CancellationToken::new();

    let client = {
        let token = token.clone();
        let path = format!("/api/v1/users/{}", user.id().get());
        async move {
            let mut stream = TcpStream::connect(addr).await.expect("connect");
            let request =
                format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
            stream
                .write_all(request.as_bytes())
                .await
                .expect("send request");
            entered.notified().await;
            token.cancel();
            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).await.expect("read response");
            String::from_utf8_lossy(&raw).into_owned()
        }
    };

    let (result, response) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(coordinator.run(token, std::future::pending()), client) },
    )
    .await
    .expect("drain completes");

    result.expect("clean shutdown");
    assert!(
        response.starts_with("HTTP/1.1 200 OK"),
        "unexpected response: {response}"
    );
    assert!(response.contains("alice@example.com"));
    assert!(
        TcpStream::connect(addr).await.is_err(),
        "listener must refuse connections after shutdown"
    );
}
