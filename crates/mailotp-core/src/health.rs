use axum::{Json, http::StatusCode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub service: &'static str,
}

/// Liveness probe, `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe, `GET /readyz`.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}

/// JSON health body for load balancers that expect one. Bind the service name
/// with a closure: `get(|| health("mailotp-verifier"))`.
pub async fn health(service: &'static str) -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        service,
    })
}
