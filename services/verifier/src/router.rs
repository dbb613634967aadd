use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mailotp_core::health::{health, healthz, readyz};
use mailotp_core::middleware::{propagate_request_id_layer, request_id_layer, require_api_key};

use crate::domain::repository::{Notifier, OtpStore};
use crate::handlers::info::service_info;
use crate::handlers::otp::{send_otp, verification_status, verify_otp};
use crate::state::AppState;

pub const SERVICE_NAME: &str = "mailotp-verifier";

pub fn build_router<S, N>(state: AppState<S, N>) -> Router
where
    S: OtpStore,
    N: Notifier + Clone + 'static,
{
    // OTP routes sit behind the api key gate; health probes do not.
    let otp = Router::new()
        .route("/send-otp", post(send_otp::<S, N>))
        .route("/verify-otp", post(verify_otp::<S, N>))
        .route(
            "/verification-status/{email}",
            get(verification_status::<S, N>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_api_key,
        ));

    // Open CORS: any origin, method and header.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(service_info))
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/health", get(|| health(SERVICE_NAME)))
        // OTP
        .merge(otp)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}
