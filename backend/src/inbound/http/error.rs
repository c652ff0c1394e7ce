//! HTTP adapter mapping for domain errors.
//!
//! Keeps [`Error`] transport agnostic while letting Actix handlers turn
//! orchestrator failures into consistent JSON responses and status codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::ports::{UserPersistenceError, UserServiceError};
use crate::domain::{Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        Error::internal("Internal server error")
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(redact_if_internal(self))
    }
}

impl From<UserServiceError> for Error {
    fn from(err: UserServiceError) -> Self {
        let operation = err.operation();
        match err.persistence() {
            UserPersistenceError::NotFound { id } => Error::not_found(format!("user {id} not found")),
            UserPersistenceError::Duplicate { .. } => {
                Error::conflict("a user with this email already exists")
            }
            UserPersistenceError::Connection { .. } => {
                error!(error = %err, %operation, "user store unavailable");
                Error::service_unavailable("user store unavailable")
            }
            UserPersistenceError::Query { .. } | UserPersistenceError::Serialization { .. } => {
                error!(error = %err, %operation, "user operation failed");
                Error::internal(err.to_string())
            }
        }
    }
}
