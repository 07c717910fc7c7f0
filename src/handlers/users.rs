use super::common::{created_response, no_content_response, success_response};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    models::{Role, User},
    services::users::{CreateUserInput, UpdateUserInput},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// User as exposed through the API; the password hash never leaves the
/// store boundary.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            phone: user.phone,
            address: user.address,
            role: user.role,
            avatar: user.avatar,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "User list", body = [UserResponse]),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.services.users.list().await?;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(success_response(users))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/:id",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User returned", body = UserResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.get(&id).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Current account profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    current_user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.get(&current_user.user_id).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserInput,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.create(payload).await?;
    Ok(created_response(UserResponse::from(user)))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/api/v1/users/:id",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserInput,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.update(&id, payload).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/api/v1/users/:id",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.delete(&id).await?;
    Ok(no_content_response())
}

/// Routes any authenticated account may call.
pub fn user_profile_routes() -> Router<AppState> {
    Router::new().route("/users/profile", get(get_profile))
}

/// Administration routes.
pub fn user_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(list_users).post(create_user),
        )
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}
