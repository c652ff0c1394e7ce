//! User entity and the per-operation parameter objects.
//!
//! The store assigns identifiers and timestamps; nothing in this module
//! fabricates them. Parameter objects derive `Serialize` because the
//! orchestrator records them verbatim in the audit trail. Secrets are
//! skipped during serialisation so the audit payload never carries them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors raised when converting raw values into user types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    NonPositiveId { value: i64 },
    UnknownRole { value: i16 },
    TimestampsOutOfOrder,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveId { value } => write!(f, "user id must be positive, got {value}"),
            Self::UnknownRole { value } => write!(f, "unknown role value {value}"),
            Self::TimestampsOutOfOrder => write!(f, "created_at must not be after updated_at"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Store-assigned user identifier.
///
/// Serialises as a bare integer. The decimal form returned by
/// [`UserId::cache_key`] is the key used by every cache adapter.
///
/// # Examples
/// ```
/// use auth_backend::domain::UserId;
///
/// let id = UserId::new(42).expect("positive id");
/// assert_eq!(id.cache_key(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and wrap a raw identifier.
    pub fn new(value: i64) -> Result<Self, UserValidationError> {
        if value <= 0 {
            return Err(UserValidationError::NonPositiveId { value });
        }
        Ok(Self(value))
    }

    /// Raw integer value as stored in the database.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Decimal string form used as the cache key.
    pub fn cache_key(self) -> String {
        self.0.to_string()
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role stored as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Role {
    /// Role value not set by the caller.
    Unspecified,
    /// Regular account.
    User,
    /// Administrative account.
    Admin,
}

impl Role {
    /// Integer representation persisted in the store and the cache.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Unspecified => 0,
            Self::User => 1,
            Self::Admin => 2,
        }
    }
}

impl TryFrom<i16> for Role {
    type Error = UserValidationError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::User),
            2 => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole { value: other }),
        }
    }
}

impl From<Role> for i16 {
    fn from(value: Role) -> Self {
        value.as_i16()
    }
}

/// A persisted user as seen by the domain.
///
/// ## Invariants
/// - `id` never changes once assigned.
/// - `created_at <= updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Field bundle used to rebuild a [`User`] from storage projections.
#[derive(Debug, Clone)]
pub struct UserParts {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Rebuild a user from its parts, enforcing timestamp ordering.
    pub fn from_parts(parts: UserParts) -> Result<Self, UserValidationError> {
        let UserParts {
            id,
            name,
            email,
            role,
            created_at,
            updated_at,
        } = parts;
        if created_at > updated_at {
            return Err(UserValidationError::TimestampsOutOfOrder);
        }
        Ok(Self {
            id,
            name,
            email,
            role,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Tri-state for an updatable field.
///
/// `Unchanged` leaves the stored value alone; `Set` overwrites it. There is
/// no implicit mapping from an empty value to `Unchanged`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum FieldUpdate<T> {
    #[default]
    Unchanged,
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Borrow the new value when one is set.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Unchanged => None,
            Self::Set(value) => Some(value),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unchanged, Self::Set)
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
    /// Pre-hashed password. Never written to the audit trail.
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: Role,
}

/// Input for reading a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserParams {
    pub user_id: UserId,
}

/// Input for updating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserParams {
    pub user_id: UserId,
    pub name: FieldUpdate<String>,
    pub role: Role,
}

/// Input for deleting a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserParams {
    pub user_id: UserId,
}
