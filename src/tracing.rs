//! Request-scoped tracing helpers.
//!
//! Every request carries a request id, propagated through a task-local so
//! error responses and log lines can reference it without threading it
//! through call signatures.

use std::future::Future;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn generate() -> Self {
        Self(format!("req-{}", Uuid::new_v4().simple()))
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RequestId;
}

/// Returns the request id for the current task, if one is in scope.
pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID.try_with(|rid| rid.clone()).ok()
}

/// Runs a future with the given request id in scope.
pub async fn scope_request_id<F>(rid: RequestId, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_REQUEST_ID.scope(rid, fut).await
}

/// Middleware ensuring every request carries a request id.
///
/// An inbound `x-request-id` header is honored so upstream proxies can
/// correlate; otherwise a fresh id is generated. The id is echoed back on the
/// response.
pub async fn request_id_middleware(req: Request<Body>, next: Next) -> Response {
    let rid = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(RequestId::new)
        .unwrap_or_else(RequestId::generate);

    let header_value = HeaderValue::from_str(rid.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("invalid-request-id"));

    let mut response = scope_request_id(rid, next.run(req)).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value);
    response
}

/// HTTP tracing layer for consistent request/response telemetry.
pub fn configure_http_tracing() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_id_is_scoped_to_the_task() {
        assert!(current_request_id().is_none());
        let seen = scope_request_id(RequestId::new("req-scoped"), async {
            current_request_id().map(|rid| rid.as_str().to_string())
        })
        .await;
        assert_eq!(seen.as_deref(), Some("req-scoped"));
        assert!(current_request_id().is_none());
    }
}
