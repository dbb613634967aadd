use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

// ── Request id ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Assign an `x-request-id` to requests that arrive without one.
pub fn request_id_layer() -> SetRequestIdLayer<MakeUuidRequestId> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeUuidRequestId)
}

/// Copy the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

// ── API key gate ─────────────────────────────────────────────────────────────

/// Shared-secret gate in front of protected routes.
///
/// With a configured key, the `x-api-key` header must match it exactly. Without
/// one, any non-empty header passes (development mode).
#[derive(Clone, Debug, Default)]
pub struct ApiKeyGate {
    expected: Option<Arc<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    Missing,
    Invalid,
}

impl ApiKeyGate {
    /// An empty key is treated as "not configured".
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    pub fn check(&self, presented: Option<&str>) -> Result<(), GateRejection> {
        let presented = match presented {
            Some(key) if !key.is_empty() => key,
            _ => return Err(GateRejection::Missing),
        };
        match &self.expected {
            Some(expected) if !bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) => {
                Err(GateRejection::Invalid)
            }
            _ => Ok(()),
        }
    }
}

impl GateRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::Missing => "api key is missing",
            Self::Invalid => "invalid api key",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "kind": "UNAUTHORIZED",
            "message": self.message(),
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Middleware enforcing [`ApiKeyGate`]. Mount with
/// `axum::middleware::from_fn_with_state(gate, require_api_key)`.
pub async fn require_api_key(
    State(gate): State<ApiKeyGate>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(&X_API_KEY)
        .and_then(|v| v.to_str().ok());
    match gate.check(presented) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            tracing::warn!(reason = rejection.message(), "request rejected by api key gate");
            rejection.into_response()
        }
    }
}
