use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::types::OutcomeKind;

/// Verifier service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("invalid email address")]
    InvalidAddress,
    #[error("code must be a 6-digit number")]
    MalformedCode,
    /// Shared by no-active-code, expired and mismatch so callers cannot tell
    /// whether a code existed.
    #[error("invalid or expired code")]
    InvalidCode,
    #[error("failed to deliver code")]
    DeliveryFailed(#[source] anyhow::Error),
    #[error("storage failure")]
    Storage(#[from] anyhow::Error),
}

impl VerifierError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::MalformedCode => "MALFORMED_CODE",
            Self::InvalidCode => "INVALID_CODE",
            Self::DeliveryFailed(_) => "DELIVERY_FAILED",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// HTTP error for a rejected verify outcome. `None` for `Success`.
    pub fn from_outcome(kind: OutcomeKind) -> Option<Self> {
        match kind {
            OutcomeKind::Success => None,
            OutcomeKind::MalformedCode => Some(Self::MalformedCode),
            OutcomeKind::NoActiveCode | OutcomeKind::Expired | OutcomeKind::Mismatch => {
                Some(Self::InvalidCode)
            }
        }
    }
}

impl IntoResponse for VerifierError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidAddress | Self::MalformedCode | Self::InvalidCode => {
                StatusCode::BAD_REQUEST
            }
            Self::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected client outcomes and are not logged here; server-side
        // failures carry the anyhow chain so the root cause is traceable.
        match &self {
            Self::Storage(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "storage failure");
            }
            Self::DeliveryFailed(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "delivery failure");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
