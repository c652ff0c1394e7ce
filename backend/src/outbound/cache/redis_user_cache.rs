//! Redis cache adapter built on `bb8-redis`.
//!
//! Each user is a hash at key `<id>` holding the flattened record from
//! [`CachedUser`]. Keys carry no TTL.

use std::collections::HashMap;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis::{self, AsyncCommands};
use tracing::debug;

use crate::domain::ports::{UserCache, UserCacheError};
use crate::domain::{User, UserId};

use super::entry::CachedUser;

/// [`UserCache`] backed by a pooled Redis connection.
#[derive(Clone)]
pub struct RedisUserCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisUserCache {
    /// Build the pool for `redis_url`. No connection is opened until first use.
    pub async fn connect(redis_url: &str, max_size: u32) -> Result<Self, UserCacheError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(backend_error)?;
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .await
            .map_err(backend_error)?;
        Ok(Self { pool })
    }

    /// Round-trip a `PING`.
    pub async fn ping(&self) -> Result<(), UserCacheError> {
        let mut conn = self.connection().await?;
        let reply: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(backend_error)?;
        debug!(%reply, "redis ping");
        Ok(())
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, UserCacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| UserCacheError::backend(err.to_string()))
    }
}

fn backend_error(err: redis::RedisError) -> UserCacheError {
    UserCacheError::backend(err.to_string())
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn create(&self, user: &User) -> Result<(), UserCacheError> {
        let key = user.id().cache_key();
        let fields = CachedUser::from(user).to_fields();
        let mut conn = self.connection().await?;
        let () = conn
            .hset_multiple(&key, &fields)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<User, UserCacheError> {
        let key = id.cache_key();
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> =
            conn.hgetall(&key).await.map_err(backend_error)?;
        CachedUser::from_fields(&key, &fields)?.into_user()
    }

    async fn delete(&self, id: UserId) -> Result<(), UserCacheError> {
        let mut conn = self.connection().await?;
        let _removed: i64 = conn.del(id.cache_key()).await.map_err(backend_error)?;
        Ok(())
    }
}
