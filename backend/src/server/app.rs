//! Actix application factories for the API and documentation listeners.

use std::net::SocketAddr;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users;

/// Shared state cloned into every API worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
}

/// Cross-origin policy for browser clients: any origin, credentials
/// allowed, and only the methods and headers the API uses.
fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::AUTHORIZATION,
        ])
        .supports_credentials()
}

/// Build the API application: user routes under `/api/v1` plus probes.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    App::new()
        .wrap(cors())
        .app_data(health_state)
        .app_data(http_state)
        .service(web::scope("/api/v1").configure(users::configure))
        .service(ready)
        .service(live)
}

/// Build the documentation application serving Swagger UI and the OpenAPI
/// document.
pub fn build_docs_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Bind the API listener.
///
/// Signal handling is left to the lifecycle coordinator, and in-flight
/// requests get `shutdown_timeout` to finish once a stop is requested.
///
/// # Errors
/// Returns [`std::io::Error`] when the address cannot be bound.
pub fn create_api_server(
    deps: AppDependencies,
    bind_addr: SocketAddr,
    shutdown_timeout: Duration,
) -> std::io::Result<Server> {
    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .disable_signals()
        .shutdown_timeout(shutdown_timeout.as_secs())
        .run();
    Ok(server)
}

/// Bind the documentation listener.
///
/// # Errors
/// Returns [`std::io::Error`] when the address cannot be bound.
pub fn create_docs_server(
    bind_addr: SocketAddr,
    shutdown_timeout: Duration,
) -> std::io::Result<Server> {
    let server = HttpServer::new(build_docs_app)
        .bind(bind_addr)?
        .disable_signals()
        .shutdown_timeout(shutdown_timeout.as_secs())
        .run();
    Ok(server)
}
