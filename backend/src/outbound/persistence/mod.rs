//! PostgreSQL persistence adapters using Diesel with `diesel-async`.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! internal; the domain only sees [`DieselUserStore`] through its ports.
//!
//! ```ignore
//! use auth_backend::outbound::persistence::{DbPool, DieselUserStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/auth")).await?;
//! let store = DieselUserStore::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_user_store;
mod models;
mod pool;
mod schema;

pub use diesel_user_store::{DieselUserRepository, DieselUserStore};
pub use pool::{DbPool, PoolConfig, PoolError};
