//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL user store and transaction manager (Diesel)
//! - **cache**: Redis and in-memory user projection caches
//! - **events**: creation event sources (in-process channel, Kafka)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no orchestration logic.

pub mod cache;
pub mod events;
pub mod persistence;
