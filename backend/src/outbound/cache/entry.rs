//! Flattened cache record shared by every cache adapter.
//!
//! A user is stored as six scalar fields with timestamps in epoch
//! milliseconds, so sub-millisecond precision is dropped on the way in.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::ports::UserCacheError;
use crate::domain::{Role, User, UserId, UserParts};

const ID: &str = "id";
const NAME: &str = "name";
const EMAIL: &str = "email";
const ROLE: &str = "role";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// Scalar projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: i16,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl From<&User> for CachedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            role: user.role().as_i16(),
            created_at_ms: user.created_at().timestamp_millis(),
            updated_at_ms: user.updated_at().timestamp_millis(),
        }
    }
}

impl CachedUser {
    /// Field/value pairs in write order.
    pub fn to_fields(&self) -> [(&'static str, String); 6] {
        [
            (ID, self.id.to_string()),
            (NAME, self.name.clone()),
            (EMAIL, self.email.clone()),
            (ROLE, self.role.to_string()),
            (CREATED_AT, self.created_at_ms.to_string()),
            (UPDATED_AT, self.updated_at_ms.to_string()),
        ]
    }

    /// Parse a field map read back from the backend. An empty map is a miss.
    pub fn from_fields(key: &str, fields: &HashMap<String, String>) -> Result<Self, UserCacheError> {
        if fields.is_empty() {
            return Err(UserCacheError::not_found(key));
        }
        Ok(Self {
            id: numeric(fields, ID)?,
            name: text(fields, NAME)?,
            email: text(fields, EMAIL)?,
            role: numeric(fields, ROLE)?,
            created_at_ms: numeric(fields, CREATED_AT)?,
            updated_at_ms: numeric(fields, UPDATED_AT)?,
        })
    }

    /// Rebuild the domain user, validating every field.
    pub fn into_user(self) -> Result<User, UserCacheError> {
        let invalid = |err: crate::domain::UserValidationError| {
            UserCacheError::serialization(err.to_string())
        };
        User::from_parts(UserParts {
            id: UserId::new(self.id).map_err(invalid)?,
            name: self.name,
            email: self.email,
            role: Role::try_from(self.role).map_err(invalid)?,
            created_at: timestamp(self.created_at_ms, CREATED_AT)?,
            updated_at: timestamp(self.updated_at_ms, UPDATED_AT)?,
        })
        .map_err(invalid)
    }
}

fn text(fields: &HashMap<String, String>, name: &str) -> Result<String, UserCacheError> {
    fields
        .get(name)
        .cloned()
        .ok_or_else(|| UserCacheError::serialization(format!("missing field {name}")))
}

fn numeric<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<T, UserCacheError> {
    let raw = text(fields, name)?;
    raw.parse()
        .map_err(|_| UserCacheError::serialization(format!("field {name} is not numeric: {raw}")))
}

fn timestamp(millis: i64, name: &str) -> Result<DateTime<Utc>, UserCacheError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| UserCacheError::serialization(format!("field {name} out of range: {millis}")))
}
