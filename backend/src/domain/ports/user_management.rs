//! Driving port exposing user operations to inbound adapters.

use async_trait::async_trait;

use crate::domain::{
    AuditAction, CreateUserParams, DeleteUserParams, GetUserParams, UpdateUserParams, User,
};

use super::UserPersistenceError;

/// Failure of an orchestrated user operation.
///
/// Wraps the store error that aborted the transaction together with the
/// operation it interrupted. Cache failures never produce this error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} user failed: {source}")]
pub struct UserServiceError {
    operation: AuditAction,
    source: UserPersistenceError,
}

impl UserServiceError {
    /// Attach the failed operation to a store error.
    pub fn new(operation: AuditAction, source: UserPersistenceError) -> Self {
        Self { operation, source }
    }

    /// Operation that failed.
    pub fn operation(&self) -> AuditAction {
        self.operation
    }

    /// Underlying store error, unchanged in kind.
    pub fn persistence(&self) -> &UserPersistenceError {
        &self.source
    }

    /// Whether the target user does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.is_not_found()
    }
}

/// Use-cases for user accounts: create, read, update and delete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserManagement: Send + Sync {
    /// Persist a new user with its audit entry, then warm the cache.
    async fn create(&self, params: CreateUserParams) -> Result<User, UserServiceError>;

    /// Fetch a user, from the cache when it holds one.
    async fn get(&self, params: GetUserParams) -> Result<User, UserServiceError>;

    /// Change the name and role of an existing user.
    async fn update(&self, params: UpdateUserParams) -> Result<User, UserServiceError>;

    /// Remove a user and evict its cache entry.
    async fn delete(&self, params: DeleteUserParams) -> Result<(), UserServiceError>;
}
