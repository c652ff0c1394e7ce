//! OpenAPI documentation for the REST API.
//!
//! [`ApiDoc`] registers the user and health endpoints together with their
//! request, response and error schemas. The documentation listener serves it
//! as JSON and through Swagger UI.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::users::{CreateUserRequest, UpdateUserRequest, UserResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Auth backend API",
        description = "User management with cache-aside reads and an audit trail."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(CreateUserRequest, UpdateUserRequest, UserResponse, Error, ErrorCode)),
    tags(
        (name = "users", description = "User accounts"),
        (name = "health", description = "Probes for orchestrators")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn document_lists_user_and_health_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        assert!(paths.contains(&"/api/v1/users"));
        assert!(paths.contains(&"/api/v1/users/{id}"));
        assert!(paths.contains(&"/health/ready"));
        assert!(paths.contains(&"/health/live"));
    }

    #[rstest]
    fn document_registers_error_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");

        assert!(components.schemas.contains_key("Error"));
        assert!(components.schemas.contains_key("UserResponse"));
    }
}
