use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub send_otp: &'static str,
    pub verify_otp: &'static str,
    pub verification_status: &'static str,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Endpoints,
}

// ── GET / ────────────────────────────────────────────────────────────────────

/// Service name, version and a map of the public routes. Not gated.
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Email OTP Verification API",
        version: env!("CARGO_PKG_VERSION"),
        description: "Issues and verifies one-time passcodes sent by email",
        endpoints: Endpoints {
            health: "/health (GET)",
            send_otp: "/send-otp (POST) - Protected",
            verify_otp: "/verify-otp (POST) - Protected",
            verification_status: "/verification-status/{email} (GET) - Protected",
        },
    })
}
