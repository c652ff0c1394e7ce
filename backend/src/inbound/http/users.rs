//! User CRUD handlers.
//!
//! ```text
//! POST   /api/v1/users       {"name":"Alice","email":"alice@x.com","passwordHash":"...","role":1}
//! GET    /api/v1/users/{id}
//! PATCH  /api/v1/users/{id}  {"name":"Alice2","role":2}
//! DELETE /api/v1/users/{id}
//! ```
//!
//! Handlers only translate JSON to parameter objects and back; every
//! consistency decision is made by the [`UserManagement`] port.
//!
//! [`UserManagement`]: crate::domain::ports::UserManagement

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    CreateUserParams, DeleteUserParams, Error, GetUserParams, Role, UpdateUserParams, User,
    UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    /// Password hash computed by the caller.
    pub password_hash: String,
    /// 0 unspecified, 1 user, 2 admin.
    pub role: i16,
}

/// Request body for `PATCH /api/v1/users/{id}`.
///
/// Omitting `name` leaves it unchanged; an empty string overwrites it.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: i16,
}

/// User representation returned by every endpoint.
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().get(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            role: user.role().as_i16(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

fn parse_role(raw: i16) -> Result<Role, Error> {
    Role::try_from(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "role", "value": raw }))
    })
}

fn parse_id(raw: i64) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "id", "value": raw }))
    })
}

impl TryFrom<CreateUserRequest> for CreateUserParams {
    type Error = Error;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            role: parse_role(value.role)?,
            name: value.name,
            email: value.email,
            hashed_password: value.password_hash,
        })
    }
}

/// Create a user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "User store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let params = CreateUserParams::try_from(payload.into_inner())?;
    let user = state.users.create(params).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Fetch a user, served from the cache when possible.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = parse_id(path.into_inner())?;
    let user = state.users.get(GetUserParams { user_id }).await?;
    Ok(web::Json(user.into()))
}

/// Update a user's name and role.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = parse_id(path.into_inner())?;
    let UpdateUserRequest { name, role } = payload.into_inner();
    let params = UpdateUserParams {
        user_id,
        name: name.into(),
        role: parse_role(role)?,
    };
    let user = state.users.update(params).await?;
    Ok(web::Json(user.into()))
}

/// Delete a user.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_id(path.into_inner())?;
    state.users.delete(DeleteUserParams { user_id }).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register every user handler on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
