use super::common::{created_response, no_content_response, success_response};
use crate::{
    auth::AuthUser,
    errors::{ApiError, ServiceError},
    handlers::AppState,
    models::{AuthorizedUser, PROVINCES},
    services::import_requests::CreateImportRequestInput,
    services::vendors::{CreateVendorInput, UpdateVendorInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CandidateSearchParams {
    /// Case- and accent-insensitive substring over username and full name
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceAuthorizedUsersRequest {
    pub authorized_users: Vec<AuthorizedUser>,
}

/// List vendors
#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    responses(
        (status = 200, description = "Vendor list", body = [crate::models::Vendor]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn list_vendors(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let vendors = state.services.vendors.list().await?;
    Ok(success_response(vendors))
}

/// Get a vendor by ID
#[utoipa::path(
    get,
    path = "/api/v1/vendors/:id",
    params(("id" = String, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Vendor returned", body = crate::models::Vendor),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.services.vendors.get(&id).await?;
    Ok(success_response(vendor))
}

/// Create a vendor
#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    request_body = CreateVendorInput,
    responses(
        (status = 201, description = "Vendor created", body = crate::models::Vendor),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    Json(payload): Json<CreateVendorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.services.vendors.create(payload).await?;
    Ok(created_response(vendor))
}

/// Update a vendor (the edit session's save, authorization list included)
#[utoipa::path(
    put,
    path = "/api/v1/vendors/:id",
    params(("id" = String, Path, description = "Vendor ID")),
    request_body = UpdateVendorInput,
    responses(
        (status = 200, description = "Vendor updated", body = crate::models::Vendor),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateVendorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.services.vendors.update(&id, payload).await?;
    Ok(success_response(vendor))
}

/// Delete a vendor
#[utoipa::path(
    delete,
    path = "/api/v1/vendors/:id",
    params(("id" = String, Path, description = "Vendor ID")),
    responses(
        (status = 204, description = "Vendor deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.vendors.delete(&id).await?;
    Ok(no_content_response())
}

/// The vendor's authorized-user list
#[utoipa::path(
    get,
    path = "/api/v1/vendors/:id/authorized-users",
    params(("id" = String, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Authorized users", body = [crate::models::AuthorizedUser]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn list_authorized_users(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.services.vendors.get(&id).await?;
    Ok(success_response(vendor.authorized_users))
}

/// Replace the vendor's authorized-user list
#[utoipa::path(
    put,
    path = "/api/v1/vendors/:id/authorized-users",
    params(("id" = String, Path, description = "Vendor ID")),
    request_body = ReplaceAuthorizedUsersRequest,
    responses(
        (status = 200, description = "List replaced", body = [crate::models::AuthorizedUser]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn replace_authorized_users(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ReplaceAuthorizedUsersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state
        .services
        .vendors
        .update(
            &id,
            UpdateVendorInput {
                name: None,
                description: None,
                address: None,
                province: None,
                phone: None,
                logo: None,
                authorized_users: Some(payload.authorized_users),
            },
        )
        .await?;
    Ok(success_response(vendor.authorized_users))
}

/// Dealer accounts that can still be added to the vendor's list
#[utoipa::path(
    get,
    path = "/api/v1/vendors/:id/authorized-users/candidates",
    params(
        ("id" = String, Path, description = "Vendor ID"),
        CandidateSearchParams
    ),
    responses(
        (status = 200, description = "Candidate accounts", body = [super::users::UserResponse]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn list_authorization_candidates(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CandidateSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let candidates = state
        .services
        .vendors
        .authorization_candidates(&id, &params.search)
        .await?;
    let candidates: Vec<super::users::UserResponse> =
        candidates.into_iter().map(Into::into).collect();
    Ok(success_response(candidates))
}

/// Import requests linked to a vendor
#[utoipa::path(
    get,
    path = "/api/v1/vendors/:id/requests",
    params(("id" = String, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Import requests", body = [crate::models::ImportRequest])
    ),
    tag = "requests"
)]
pub async fn list_vendor_requests(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Surface a clean 404 for unknown vendors rather than an empty list.
    state.services.vendors.get(&id).await?;
    let requests = state.services.import_requests.list_for_vendor(&id).await?;
    Ok(success_response(requests))
}

/// File a stock replenishment request on behalf of a vendor.
///
/// Dealers must be on the vendor's authorized-user list; managers and admins
/// may file for any vendor.
#[utoipa::path(
    post,
    path = "/api/v1/vendors/:id/requests",
    params(("id" = String, Path, description = "Vendor ID")),
    request_body = CreateImportRequestInput,
    responses(
        (status = 201, description = "Request filed", body = crate::models::ImportRequest),
        (status = 403, description = "Not authorized for this vendor", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn create_vendor_request(
    State(state): State<AppState>,
    current_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CreateImportRequestInput>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.services.vendors.get(&id).await?;
    let is_staff = current_user.is_admin() || current_user.has_role("manager");
    let is_authorized = vendor
        .authorized_users
        .iter()
        .any(|entry| entry.user_id == current_user.user_id);
    if !is_staff && !is_authorized {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(format!(
            "account is not authorized to act on behalf of vendor {}",
            vendor.name
        ))));
    }

    let request = state.services.import_requests.create(&id, payload).await?;
    Ok(created_response(request))
}

/// Approve a pending import request
#[utoipa::path(
    post,
    path = "/api/v1/requests/:id/approve",
    params(("id" = String, Path, description = "Import request ID")),
    responses(
        (status = 200, description = "Request approved", body = crate::models::ImportRequest),
        (status = 400, description = "Request already rejected", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent update, retry", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.services.approvals.approve(&id).await?;
    Ok(success_response(request))
}

/// Reject a pending import request
#[utoipa::path(
    post,
    path = "/api/v1/requests/:id/reject",
    params(("id" = String, Path, description = "Import request ID")),
    responses(
        (status = 200, description = "Request rejected", body = crate::models::ImportRequest),
        (status = 400, description = "Request already approved", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.services.approvals.reject(&id).await?;
    Ok(success_response(request))
}

/// Provinces vendors may register an address in
#[utoipa::path(
    get,
    path = "/api/v1/provinces",
    responses((status = 200, description = "Province names", body = [String])),
    tag = "vendors"
)]
pub async fn list_provinces() -> impl IntoResponse {
    success_response(PROVINCES)
}

/// Routes for any authenticated account. Filing a request stays here because
/// the per-vendor authorization check happens in the handler.
pub fn vendor_read_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors))
        .route("/vendors/:id", get(get_vendor))
        .route(
            "/vendors/:id/requests",
            get(list_vendor_requests).post(create_vendor_request),
        )
}

pub fn vendor_write_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", post(create_vendor))
        .route(
            "/vendors/:id",
            put(update_vendor).delete(delete_vendor),
        )
        .route(
            "/vendors/:id/authorized-users",
            get(list_authorized_users).put(replace_authorized_users),
        )
        .route(
            "/vendors/:id/authorized-users/candidates",
            get(list_authorization_candidates),
        )
}

/// Approval decisions.
pub fn request_decision_routes() -> Router<AppState> {
    Router::new()
        .route("/requests/:id/approve", post(approve_request))
        .route("/requests/:id/reject", post(reject_request))
}
