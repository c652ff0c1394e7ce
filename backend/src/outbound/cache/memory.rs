//! Process-local cache adapter.
//!
//! Stores the same flattened record as the Redis adapter so both behave
//! identically with respect to timestamp precision and decoding.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{UserCache, UserCacheError};
use crate::domain::{User, UserId};

use super::entry::CachedUser;

/// [`UserCache`] backed by a map behind a `tokio` read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryUserCache {
    entries: RwLock<HashMap<String, CachedUser>>,
}

impl InMemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry exists for `id`.
    pub async fn contains(&self, id: UserId) -> bool {
        self.entries.read().await.contains_key(&id.cache_key())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn create(&self, user: &User) -> Result<(), UserCacheError> {
        self.entries
            .write()
            .await
            .insert(user.id().cache_key(), CachedUser::from(user));
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<User, UserCacheError> {
        let key = id.cache_key();
        let entry = self
            .entries
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| UserCacheError::not_found(key))?;
        entry.into_user()
    }

    async fn delete(&self, id: UserId) -> Result<(), UserCacheError> {
        self.entries.write().await.remove(&id.cache_key());
        Ok(())
    }
}
