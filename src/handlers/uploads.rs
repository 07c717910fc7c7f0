use super::common::success_response;
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"image": "aGVsbG8gd29ybGQ="}))]
pub struct UploadImageRequest {
    /// Base64-encoded image bytes
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadImageResponse {
    /// Publicly retrievable URL of the hosted image
    pub url: String,
}

/// Upload an image to the hosting service
#[utoipa::path(
    post,
    path = "/api/v1/uploads/images",
    request_body = UploadImageRequest,
    responses(
        (status = 200, description = "Image hosted", body = UploadImageResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 502, description = "Image host failure", body = crate::errors::ErrorResponse)
    ),
    tag = "uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    Json(payload): Json<UploadImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let url = state.services.images.upload(&payload.image).await?;
    Ok(success_response(UploadImageResponse { url }))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/uploads/images", post(upload_image))
}
