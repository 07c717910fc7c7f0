use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use dealerdesk_api::{
    api_v1_routes,
    auth::{auth_routes, AuthConfig, AuthService},
    config::AppConfig,
    models::{Role, User},
    services::users::CreateUserInput,
    store::{DocumentStore, MemoryStore},
    AppState,
};

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness spinning up the full router over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    auth_service: Arc<AuthService>,
}

impl TestApp {
    /// Construct a new test application with fresh state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            None,
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18080,
            "test".to_string(),
        );

        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, store.clone()));
        let state = AppState::new(store, cfg);

        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .nest("/auth", auth_routes().with_state(auth_service.clone()))
            .layer(axum::middleware::from_fn_with_state(
                auth_service.clone(),
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .layer(axum::middleware::from_fn(
                dealerdesk_api::tracing::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
        }
    }

    /// Create an account directly in the store and return it with a token.
    pub async fn create_account(&self, username: &str, role: Role) -> (User, String) {
        let user = self
            .state
            .services
            .users
            .create(CreateUserInput {
                username: username.to_string(),
                password: "SecurePass123!".to_string(),
                full_name: format!("Test {role}"),
                phone: String::new(),
                address: String::new(),
                role,
                avatar: String::new(),
            })
            .await
            .expect("failed to create test account");
        let token = self
            .auth_service
            .generate_token(&user)
            .expect("failed to issue test token")
            .access_token;
        (user, token)
    }

    /// Issue a request against the router and parse the JSON response body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, None).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }
}
