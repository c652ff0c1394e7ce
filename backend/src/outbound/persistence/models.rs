//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; the domain only ever
//! sees [`User`] and [`AuditLogEntry`].

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{AuditLogEntry, CreateUserParams, Role, UpdateUserParams, User, UserId, UserParts};

use super::schema::{audit_logs, users};

/// Row read from `users`. The password hash is never selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = crate::domain::UserValidationError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        User::from_parts(UserParts {
            id: UserId::new(row.id)?,
            name: row.name,
            email: row.email,
            role: Role::try_from(row.role)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub role: i16,
}

impl<'a> From<&'a CreateUserParams> for NewUserRow<'a> {
    fn from(params: &'a CreateUserParams) -> Self {
        Self {
            name: &params.name,
            email: &params.email,
            hashed_password: &params.hashed_password,
            role: params.role.as_i16(),
        }
    }
}

/// Changeset for updates. A `None` name is skipped, keeping the stored value.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub name: Option<&'a str>,
    pub role: i16,
}

impl<'a> From<&'a UpdateUserParams> for UserChangeset<'a> {
    fn from(params: &'a UpdateUserParams) -> Self {
        Self {
            name: params.name.as_set().map(String::as_str),
            role: params.role.as_i16(),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_logs)]
pub(crate) struct NewAuditLogRow<'a> {
    pub action_type: &'a str,
    pub request_data: &'a serde_json::Value,
    pub response_data: Option<&'a serde_json::Value>,
}

impl<'a> From<&'a AuditLogEntry> for NewAuditLogRow<'a> {
    fn from(entry: &'a AuditLogEntry) -> Self {
        Self {
            action_type: entry.action.as_str(),
            request_data: &entry.request,
            response_data: entry.response.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldUpdate;
    use rstest::rstest;

    #[rstest]
    #[case(FieldUpdate::Unchanged, None)]
    #[case(FieldUpdate::Set(String::new()), Some(""))]
    #[case(FieldUpdate::Set("Alice2".to_owned()), Some("Alice2"))]
    fn changeset_only_carries_set_names(
        #[case] name: FieldUpdate<String>,
        #[case] expected: Option<&str>,
    ) {
        let params = UpdateUserParams {
            user_id: UserId::new(1).expect("id"),
            name,
            role: Role::Admin,
        };

        let changeset = UserChangeset::from(&params);

        assert_eq!(changeset.name, expected);
        assert_eq!(changeset.role, 2);
    }

    #[rstest]
    fn row_with_unknown_role_is_rejected() {
        let now = Utc::now();
        let row = UserRow {
            id: 1,
            name: "Alice".to_owned(),
            email: "alice@x.com".to_owned(),
            role: 7,
            created_at: now,
            updated_at: now,
        };

        assert!(User::try_from(row).is_err());
    }
}
