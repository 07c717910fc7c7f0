use super::common::{created_response, no_content_response, success_response};
use crate::{
    handlers::AppState,
    errors::ApiError,
    models::ProductStatus,
    services::products::{CreateProductInput, UpdateProductInput},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: ProductStatus,
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Product list", body = [crate::models::Product]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.products.list().await?;
    Ok(success_response(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/:id",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = crate::models::Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get(&id).await?;
    Ok(success_response(product))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::models::Product),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.create(payload).await?;
    Ok(created_response(product))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/:id",
    params(("id" = String, Path, description = "Product ID")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = crate::models::Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.update(&id, payload).await?;
    Ok(success_response(product))
}

/// Toggle a product between active and inactive
#[utoipa::path(
    put,
    path = "/api/v1/products/:id/status",
    params(("id" = String, Path, description = "Product ID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = crate::models::Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn set_product_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .set_status(&id, payload.status)
        .await?;
    Ok(success_response(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/:id",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete(&id).await?;
    Ok(no_content_response())
}

/// Read-only product routes.
pub fn product_read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

/// Catalog mutation routes, gated separately.
pub fn product_write_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            axum::routing::post(create_product),
        )
        .route(
            "/products/:id",
            put(update_product).delete(delete_product),
        )
        .route("/products/:id/status", put(set_product_status))
}
