//! Port for the best-effort user projection cache.
//!
//! Entries never expire on their own; only [`UserCache::delete`] removes
//! them. Losing an entry is always safe because the next miss repopulates it
//! from the store.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by cache adapters.
    pub enum UserCacheError {
        /// No entry exists for the key.
        NotFound { key: String } => "user cache entry {key} not found",
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "user cache backend failure: {message}",
        /// A stored entry could not be decoded.
        Serialization { message: String } => "user cache entry malformed: {message}",
    }
}

impl UserCacheError {
    /// Whether this is the plain miss the orchestrator repopulates on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Key-value projection of users keyed by the decimal id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserCache: Send + Sync {
    /// Write (or overwrite) the projection for `user`.
    async fn create(&self, user: &User) -> Result<(), UserCacheError>;

    /// Read the projection; an absent key is [`UserCacheError::NotFound`].
    async fn get(&self, id: UserId) -> Result<User, UserCacheError>;

    /// Evict the projection. Evicting an absent key succeeds.
    async fn delete(&self, id: UserId) -> Result<(), UserCacheError>;
}
