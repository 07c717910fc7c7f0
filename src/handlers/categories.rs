use super::common::{created_response, no_content_response, success_response};
use crate::{
    errors::{ApiError, ServiceError},
    handlers::AppState,
    services::categories::{CreateCategoryInput, UpdateCategoryInput},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};

/// List categories as the flat record set
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Category list", body = [crate::models::Category]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.services.categories.list().await?;
    Ok(success_response(categories))
}

/// The category forest used by product forms and listings
#[utoipa::path(
    get,
    path = "/api/v1/categories/tree",
    responses(
        (status = 200, description = "Category forest", body = [crate::models::CategoryNode])
    ),
    tag = "categories"
)]
pub async fn category_tree(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tree = state.services.categories.tree().await?;
    Ok(success_response(tree))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category returned", body = crate::models::Category),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.categories.get(&id).await?;
    Ok(success_response(category))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created", body = crate::models::Category),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.categories.create(payload).await?;
    Ok(created_response(category))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/:id",
    params(("id" = String, Path, description = "Category ID")),
    request_body = UpdateCategoryInput,
    responses(
        (status = 200, description = "Category updated", body = crate::models::Category),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.categories.update(&id, payload).await?;
    Ok(success_response(category))
}

/// Delete a category. Categories that still have children must be emptied
/// first.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/:id",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has children", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.services.categories.has_children(&id).await? {
        return Err(ApiError::ServiceError(ServiceError::Conflict(
            "category still has child categories".to_string(),
        )));
    }
    state.services.categories.delete(&id).await?;
    Ok(no_content_response())
}

pub fn category_read_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/tree", get(category_tree))
        .route("/categories/:id", get(get_category))
}

pub fn category_write_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", axum::routing::post(create_category))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
}
