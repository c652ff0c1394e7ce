//! User projection cache adapters.
//!
//! - [`RedisUserCache`]: shared cache for multi-instance deployments.
//! - [`InMemoryUserCache`]: process-local cache used when no Redis URL is
//!   configured and in tests.

mod entry;
mod memory;
mod redis_user_cache;

pub use entry::CachedUser;
pub use memory::InMemoryUserCache;
pub use redis_user_cache::RedisUserCache;
