//! Domain primitives, ports and services.
//!
//! Purpose: define the user entity, its parameter objects, the audit trail
//! and the transport-agnostic error payload, together with the ports the
//! outbound adapters implement. The cache-aside orchestrator
//! ([`UserService`]) and the broker consumer ([`UserCreationConsumer`]) live
//! here and depend only on those ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - User, UserId, Role, FieldUpdate and the `*UserParams` objects.
//! - AuditAction / AuditLogEntry: audit trail records.
//! - UserService: cache-aside orchestration of user operations.
//! - UserCreationConsumer / IngestionError: fail-fast event ingestion.

pub mod audit;
pub mod error;
pub mod ports;
pub mod user;
pub mod user_ingestion;
pub mod user_service;

pub use self::audit::{AuditAction, AuditLogEntry};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::user::{
    CreateUserParams, DeleteUserParams, FieldUpdate, GetUserParams, Role, UpdateUserParams, User,
    UserId, UserParts, UserValidationError,
};
pub use self::user_ingestion::{CreateUserEvent, IngestionError, UserCreationConsumer};
pub use self::user_service::UserService;
