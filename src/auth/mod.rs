/*!
 * # Authentication and Authorization Module
 *
 * JWT-based authentication for the console API, plus coarse role-based
 * gating applied at the router boundary. Tokens are issued against accounts
 * in the `users` collection; passwords are hashed with argon2.
 */

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Role, User};
use crate::store::{collections, DocumentStore, QueryOp};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub username: String,
    pub role: Role,
    pub jti: String,    // JWT ID (unique identifier for this token)
    pub iat: i64,       // Issued at time
    pub exp: i64,       // Expiration time
    pub nbf: i64,       // Not valid before time
    pub iss: String,    // Issuer
    pub aud: String,    // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.to_string() == role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed")]
    HashFailure,

    #[error("Store error: {0}")]
    StoreError(#[from] crate::store::StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                self.to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                self.to_string(),
            ),
            Self::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                self.to_string(),
            ),
            Self::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_EXPIRED_TOKEN",
                self.to_string(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                self.to_string(),
            ),
            Self::AccountExists(_) => (
                StatusCode::CONFLICT,
                "AUTH_ACCOUNT_EXISTS",
                self.to_string(),
            ),
            Self::ValidationError(_) => (
                StatusCode::BAD_REQUEST,
                "AUTH_VALIDATION_ERROR",
                self.to_string(),
            ),
            Self::TokenCreation(_) | Self::HashFailure | Self::StoreError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal authentication error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Authentication service that handles account creation, token issuance and
/// validation.
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    store: Arc<dyn DocumentStore>,
}

impl AuthService {
    pub fn new(config: AuthConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &User) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let expires = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        Ok(data.claims)
    }

    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::HashFailure)
    }

    pub fn verify_password(password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let docs = self
            .store
            .query(
                collections::USERS,
                "username",
                QueryOp::Eq,
                &json!(username),
            )
            .await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.to()?)),
            None => Ok(None),
        }
    }

    /// Check credentials against the `users` collection and issue a token.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, AuthError> {
        let user = self
            .find_by_username(&credentials.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(&credentials.password, &user.password_hash) {
            debug!(username = %credentials.username, "password verification failed");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.generate_token(&user)?;
        Ok(LoginResponse {
            user_id: user.id,
            username: user.username,
            role: user.role,
            token,
        })
    }

    /// Create the account and its `users` document in one step, then log the
    /// new account in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;

        if self.find_by_username(&request.username).await?.is_some() {
            return Err(AuthError::AccountExists(request.username.clone()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().simple().to_string(),
            username: request.username.clone(),
            full_name: request.full_name.clone().unwrap_or_default(),
            phone: request.phone.clone().unwrap_or_default(),
            address: request.address.clone().unwrap_or_default(),
            role: request.role.unwrap_or(Role::Dealer),
            avatar: request.avatar.clone().unwrap_or_default(),
            password_hash: Self::hash_password(&request.password)?,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(
                collections::USERS,
                serde_json::to_value(&user).map_err(crate::store::StoreError::from)?,
                Some(user.id.clone()),
            )
            .await?;

        let token = self.generate_token(&user)?;
        Ok(LoginResponse {
            user_id: user.id,
            username: user.username,
            role: user.role,
            token,
        })
    }
}

/// Login request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginCredentials {
    /// Login email
    #[schema(example = "admin@dealerdesk.dev")]
    pub username: String,
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Registration request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "username must be an email address"))]
    #[schema(example = "dealer@dealerdesk.dev")]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Defaults to `dealer` when omitted
    pub role: Option<Role>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    #[serde(flatten)]
    pub token: TokenResponse,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication middleware that extracts and validates auth tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .map(str::to_string);

    let Some(token) = token else {
        return AuthError::MissingAuth.into_response();
    };

    match auth_service.validate_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser {
                user_id: claims.sub,
                username: claims.username,
                role: claims.role,
            });
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role middleware: the role string must match the user's role exactly;
/// admins pass any gate.
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    if user.is_admin() || user.has_role(&required_role) {
        return Ok(next.run(request).await);
    }

    Err(AuthError::InsufficientPermissions)
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/login", axum::routing::post(login_handler))
        .route("/register", axum::routing::post(register_handler))
        .layer(DefaultBodyLimit::max(1024 * 64)) // 64KB limit
}

/// Login handler
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = auth_service.login(&credentials).await?;
    Ok(Json(response))
}

/// Registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = LoginResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Account already exists")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = auth_service.register(&request).await?;
    Ok(Json(response))
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "test_secret_key_that_is_long_enough_for_tests".to_string(),
            "dealerdesk-auth".to_string(),
            "dealerdesk-api".to_string(),
            Duration::from_secs(3600),
        );
        AuthService::new(config, Arc::new(MemoryStore::new()))
    }

    fn test_user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: "u1".to_string(),
            username: "admin@dealerdesk.dev".to_string(),
            full_name: "Admin".to_string(),
            phone: String::new(),
            address: String::new(),
            role,
            avatar: String::new(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_roundtrip_preserves_claims() {
        let service = test_service();
        let token = service.generate_token(&test_user(Role::Manager)).unwrap();

        let claims = service.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "admin@dealerdesk.dev");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let token = service.generate_token(&test_user(Role::Admin)).unwrap();
        let mut tampered = token.access_token.clone();
        tampered.push('x');
        assert!(service.validate_token(&tampered).is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = AuthService::hash_password("hunter2hunter2").unwrap();
        assert!(AuthService::verify_password("hunter2hunter2", &hash));
        assert!(!AuthService::verify_password("wrong", &hash));
        assert!(!AuthService::verify_password("hunter2hunter2", "not-a-hash"));
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = test_service();
        let request = RegisterRequest {
            username: "dealer@dealerdesk.dev".to_string(),
            password: "SecurePass123!".to_string(),
            full_name: Some("Dealer One".to_string()),
            phone: None,
            address: None,
            role: None,
            avatar: None,
        };
        let registered = service.register(&request).await.unwrap();
        assert_eq!(registered.role, Role::Dealer);

        let login = service
            .login(&LoginCredentials {
                username: "dealer@dealerdesk.dev".to_string(),
                password: "SecurePass123!".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user_id, registered.user_id);

        let err = service
            .login(&LoginCredentials {
                username: "dealer@dealerdesk.dev".to_string(),
                password: "bad-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let service = test_service();
        let request = RegisterRequest {
            username: "dup@dealerdesk.dev".to_string(),
            password: "SecurePass123!".to_string(),
            full_name: None,
            phone: None,
            address: None,
            role: None,
            avatar: None,
        };
        service.register(&request).await.unwrap();
        let err = service.register(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountExists(_)));
    }

    #[test]
    fn admin_passes_any_role_gate() {
        let admin = AuthUser {
            user_id: "u1".to_string(),
            username: "a".to_string(),
            role: Role::Admin,
        };
        assert!(admin.is_admin());
        assert!(!admin.has_role("manager"));

        let dealer = AuthUser {
            user_id: "u2".to_string(),
            username: "d".to_string(),
            role: Role::Dealer,
        };
        assert!(dealer.has_role("dealer"));
        assert!(!dealer.is_admin());
    }
}
