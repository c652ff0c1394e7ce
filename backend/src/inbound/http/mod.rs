//! HTTP inbound adapter exposing REST endpoints and health probes.

pub mod error;
pub mod health;
pub mod state;
pub mod users;

pub use error::ApiResult;
