//! Consumer that turns broker creation events into stored users.
//!
//! Events bypass the orchestrator: rows are written through
//! [`UserStore::run`] with no audit entry and no cache warm-up. Any failure
//! ends the loop and is returned to the caller, which treats it as fatal.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::ports::{
    CreationEventSource, CreationMessage, EventSourceError, UserPersistenceError, UserStore,
    repository_work,
};
use crate::domain::{CreateUserParams, Role, User};

/// Failure that stops the ingestion loop.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("malformed creation event at {topic}/{partition}@{offset}: {message}")]
    Decode {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },
    #[error("storing ingested user failed: {0}")]
    Store(#[from] UserPersistenceError),
    #[error(transparent)]
    Source(#[from] EventSourceError),
}

/// Wire payload of a user-creation event.
///
/// ```json
/// {"name": "Bob", "email": "bob@x.com", "password": "<hash>", "role": 1}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserEvent {
    pub name: String,
    pub email: String,
    /// Already hashed by the producer.
    pub password: String,
    pub role: i16,
}

impl CreateUserEvent {
    fn into_params(self) -> Result<CreateUserParams, String> {
        let role = Role::try_from(self.role).map_err(|err| err.to_string())?;
        Ok(CreateUserParams {
            name: self.name,
            email: self.email,
            hashed_password: self.password,
            role,
        })
    }
}

fn decode(message: &CreationMessage) -> Result<CreateUserParams, IngestionError> {
    let decode_error = |detail: String| IngestionError::Decode {
        topic: message.topic.clone(),
        partition: message.partition,
        offset: message.offset,
        message: detail,
    };
    let event: CreateUserEvent =
        serde_json::from_slice(&message.payload).map_err(|err| decode_error(err.to_string()))?;
    event.into_params().map_err(decode_error)
}

/// Fail-fast consumer of user-creation events.
pub struct UserCreationConsumer<S, E> {
    store: Arc<S>,
    source: Arc<E>,
}

impl<S, E> UserCreationConsumer<S, E>
where
    S: UserStore,
    E: CreationEventSource,
{
    pub fn new(store: Arc<S>, source: Arc<E>) -> Self {
        Self { store, source }
    }

    /// Consume until `token` is cancelled or the source is exhausted.
    ///
    /// Cancellation interrupts a pending receive but never a message that is
    /// already being stored.
    pub async fn run(&self, token: CancellationToken) -> Result<(), IngestionError> {
        info!("user ingestion started");
        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => {
                    info!("user ingestion cancelled");
                    return Ok(());
                }
                next = self.source.recv() => next?,
            };
            let Some(message) = next else {
                info!("user creation stream ended");
                return Ok(());
            };
            self.handle(&message).await?;
        }
    }

    /// Decode, store and acknowledge one message.
    pub async fn handle(&self, message: &CreationMessage) -> Result<User, IngestionError> {
        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "received user creation event"
        );
        let params = decode(message)?;
        let user = self
            .store
            .run(repository_work(move |repo| {
                Box::pin(async move { repo.create_user(&params).await })
            }))
            .await?;
        self.source.commit(message).await?;
        info!(user_id = %user.id(), offset = message.offset, "ingested user");
        Ok(user)
    }
}
