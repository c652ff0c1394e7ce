//! Ports for durable user storage and the units of work that run against it.
//!
//! A [`UserRepository`] is always scoped to one connection. Callers never hold
//! one directly: they hand a [`RepositoryWork`] closure to either
//! [`TransactionManager::read_committed`] (atomic, used by the orchestrator)
//! or [`UserStore::run`] (statement-level autocommit, used by ingestion).

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::domain::{AuditLogEntry, CreateUserParams, UpdateUserParams, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// No user row exists for the identifier.
        NotFound { id: i64 } => "user {id} not found",
        /// A uniqueness constraint rejected the write.
        Duplicate { message: String } => "user already exists: {message}",
        /// A payload could not be encoded for storage.
        Serialization { message: String } => "user payload serialisation failed: {message}",
    }
}

impl UserPersistenceError {
    /// Whether the failure is a missing row rather than an infrastructure fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Connection-scoped CRUD access to users and audit rows.
#[async_trait]
pub trait UserRepository: Send {
    /// Insert a user and return it with the store-assigned id and timestamps.
    async fn create_user(&mut self, params: &CreateUserParams)
    -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier; a missing row is [`UserPersistenceError::NotFound`].
    async fn get_user(&mut self, id: UserId) -> Result<User, UserPersistenceError>;

    /// Apply an update. An unchanged name keeps the stored value.
    async fn update_user(&mut self, params: &UpdateUserParams)
    -> Result<User, UserPersistenceError>;

    /// Remove a user row.
    async fn delete_user(&mut self, id: UserId) -> Result<(), UserPersistenceError>;

    /// Append an audit row on the same connection as the triggering call.
    async fn create_audit_log(&mut self, entry: &AuditLogEntry) -> Result<(), UserPersistenceError>;
}

/// Unit of work executed against a connection-scoped repository.
pub type RepositoryWork<'a, T> = Box<
    dyn for<'r> FnOnce(&'r mut dyn UserRepository) -> BoxFuture<'r, Result<T, UserPersistenceError>>
        + Send
        + 'a,
>;

/// Box a closure as a [`RepositoryWork`].
///
/// The explicit bound lets the compiler infer a higher-ranked signature for
/// the closure argument.
///
/// # Examples
/// ```
/// use auth_backend::domain::UserId;
/// use auth_backend::domain::ports::{RepositoryWork, repository_work};
///
/// let id = UserId::new(1).expect("id");
/// let _work: RepositoryWork<'_, _> =
///     repository_work(move |repo| Box::pin(async move { repo.get_user(id).await }));
/// ```
pub fn repository_work<'a, T, F>(work: F) -> RepositoryWork<'a, T>
where
    F: for<'r> FnOnce(
            &'r mut dyn UserRepository,
        ) -> BoxFuture<'r, Result<T, UserPersistenceError>>
        + Send
        + 'a,
{
    Box::new(work)
}

/// Runs units of work inside a database transaction.
///
/// Concurrent calls receive independent transactions. There is no retry: a
/// serialisation or connectivity failure reaches the caller unchanged.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Run `work` at Read Committed isolation. Commits iff `work` returns
    /// `Ok`; otherwise rolls back and returns the work's error unchanged.
    async fn read_committed<T>(&self, work: RepositoryWork<'_, T>) -> Result<T, UserPersistenceError>
    where
        T: Send;
}

/// Runs units of work on a pooled connection without an explicit transaction.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Run `work`; each statement commits on its own.
    async fn run<T>(&self, work: RepositoryWork<'_, T>) -> Result<T, UserPersistenceError>
    where
        T: Send;
}
