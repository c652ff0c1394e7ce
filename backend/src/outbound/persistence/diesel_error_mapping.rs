//! Translation of Diesel failures into user persistence errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::UserPersistenceError;

/// Map a Diesel error, keeping uniqueness and connectivity distinguishable.
pub(crate) fn map_diesel_error(error: DieselError) -> UserPersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = ?info.constraint_name(),
                "diesel operation failed"
            );
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            UserPersistenceError::duplicate(info.message())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            UserPersistenceError::connection(info.message())
        }
        DieselError::SerializationError(err) | DieselError::DeserializationError(err) => {
            UserPersistenceError::serialization(err.to_string())
        }
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        other => UserPersistenceError::query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn database_error(kind: DatabaseErrorKind, message: &str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(message.to_owned()))
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate() {
        let err = map_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
        ));

        assert!(matches!(err, UserPersistenceError::Duplicate { .. }));
        assert!(err.to_string().contains("users_email_key"));
    }

    #[rstest]
    fn closed_connection_maps_to_connection() {
        let err = map_diesel_error(database_error(
            DatabaseErrorKind::ClosedConnection,
            "server closed the connection",
        ));

        assert!(matches!(err, UserPersistenceError::Connection { .. }));
    }

    #[rstest]
    #[case(DatabaseErrorKind::ForeignKeyViolation)]
    #[case(DatabaseErrorKind::SerializationFailure)]
    fn other_database_errors_map_to_query(#[case] kind: DatabaseErrorKind) {
        let err = map_diesel_error(database_error(kind, "rejected"));
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn rollback_errors_map_to_query() {
        let err = map_diesel_error(DieselError::RollbackTransaction);
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }
}
