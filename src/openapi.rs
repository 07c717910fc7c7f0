use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth, errors, handlers, models};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DealerDesk API",
        version = "0.3.0",
        description = r#"
# DealerDesk Admin Console API

Backend for a small e-commerce admin console: catalog and category
management, user accounts with roles, vendor/dealer relationships and the
stock replenishment approval workflow.

## Authentication

All `/api/v1` endpoints require a JWT issued by `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Role gating is coarse: `admin` administers accounts and passes every gate,
`manager` maintains the catalog and vendors and decides import requests,
`dealer` files replenishment requests for vendors it is authorized for.

## Error Handling

Errors use a consistent JSON envelope with the HTTP status, a message and
the request id:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock for \"Kettle\": requested 5, available 3",
  "request_id": "req-abc123",
  "timestamp": "2025-11-09T10:30:00Z"
}
```
        "#,
        contact(name = "DealerDesk Support", email = "support@dealerdesk.dev"),
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        auth::login_handler,
        auth::register_handler,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::set_product_status,
        handlers::products::delete_product,
        handlers::categories::list_categories,
        handlers::categories::category_tree,
        handlers::categories::get_category,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::get_profile,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::vendors::list_vendors,
        handlers::vendors::get_vendor,
        handlers::vendors::create_vendor,
        handlers::vendors::update_vendor,
        handlers::vendors::delete_vendor,
        handlers::vendors::list_authorized_users,
        handlers::vendors::replace_authorized_users,
        handlers::vendors::list_authorization_candidates,
        handlers::vendors::list_vendor_requests,
        handlers::vendors::create_vendor_request,
        handlers::vendors::approve_request,
        handlers::vendors::reject_request,
        handlers::vendors::list_provinces,
        handlers::uploads::upload_image,
    ),
    components(schemas(
        errors::ErrorResponse,
        models::Category,
        models::CategoryNode,
        models::Product,
        models::ProductStatus,
        models::Vendor,
        models::AuthorizedUser,
        models::ImportRequest,
        models::RequestStatus,
        models::Role,
        auth::LoginCredentials,
        auth::RegisterRequest,
        auth::TokenResponse,
        auth::LoginResponse,
        handlers::users::UserResponse,
        handlers::uploads::UploadImageRequest,
        handlers::uploads::UploadImageResponse,
        handlers::products::SetStatusRequest,
        handlers::vendors::ReplaceAuthorizedUsersRequest,
        crate::services::products::CreateProductInput,
        crate::services::products::UpdateProductInput,
        crate::services::categories::CreateCategoryInput,
        crate::services::categories::UpdateCategoryInput,
        crate::services::users::CreateUserInput,
        crate::services::users::UpdateUserInput,
        crate::services::vendors::CreateVendorInput,
        crate::services::vendors::UpdateVendorInput,
        crate::services::import_requests::CreateImportRequestInput,
    )),
    tags(
        (name = "auth", description = "Login and registration"),
        (name = "products", description = "Catalog products"),
        (name = "categories", description = "Hierarchical categories"),
        (name = "users", description = "Console accounts"),
        (name = "vendors", description = "Vendors and authorization lists"),
        (name = "requests", description = "Stock replenishment requests"),
        (name = "uploads", description = "Image hosting"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
