use mailotp_core::middleware::ApiKeyGate;

/// Shared application state passed to every handler via axum `State`.
///
/// `S` backs the ledger and identity store; `N` delivers issued codes.
#[derive(Clone)]
pub struct AppState<S, N> {
    pub store: S,
    pub notifier: N,
    pub gate: ApiKeyGate,
}
