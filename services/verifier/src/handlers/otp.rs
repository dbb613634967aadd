use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mailotp_core::clock::SystemClock;

use crate::domain::repository::{Notifier, OtpStore};
use crate::domain::validation::EmailAddress;
use crate::error::VerifierError;
use crate::state::AppState;
use crate::usecase::issue::{IssueOtpInput, IssueOtpUseCase};
use crate::usecase::status::GetStatusUseCase;
use crate::usecase::verify::{VerifyOtpInput, VerifyOtpUseCase};

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: &'static str,
    pub email: String,
    #[serde(serialize_with = "mailotp_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: &'static str,
    pub email: String,
    pub verified: bool,
}

#[derive(Serialize)]
pub struct VerificationStatusResponse {
    pub email: String,
    pub is_verified: bool,
    pub message: &'static str,
}

// ── POST /send-otp ───────────────────────────────────────────────────────────

pub async fn send_otp<S, N>(
    State(state): State<AppState<S, N>>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, VerifierError>
where
    S: OtpStore,
    N: Notifier + Clone + 'static,
{
    let uc = IssueOtpUseCase {
        repo: state.store.clone(),
        clock: SystemClock,
    };
    let issued = uc.execute(IssueOtpInput { email: body.email }).await?;

    // The code stays active if delivery fails; a retry issues a new one.
    state.notifier.notify(&issued).await?;

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent successfully",
        email: issued.address.to_string(),
        expires_at: issued.expires_at,
    }))
}

// ── POST /verify-otp ─────────────────────────────────────────────────────────

pub async fn verify_otp<S, N>(
    State(state): State<AppState<S, N>>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, VerifierError>
where
    S: OtpStore,
    N: Notifier + Clone + 'static,
{
    let uc = VerifyOtpUseCase {
        repo: state.store.clone(),
        clock: SystemClock,
    };
    let outcome = uc
        .execute(VerifyOtpInput {
            email: body.email.clone(),
            code: body.otp,
        })
        .await?;

    if let Some(err) = VerifierError::from_outcome(outcome.kind) {
        return Err(err);
    }

    // Already validated by the use case; re-parsed for the normalized form.
    let address = EmailAddress::parse(&body.email)?;
    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "Email verified successfully",
        email: address.to_string(),
        verified: outcome.now_verified,
    }))
}

// ── GET /verification-status/{email} ─────────────────────────────────────────

pub async fn verification_status<S, N>(
    State(state): State<AppState<S, N>>,
    Path(email): Path<String>,
) -> Result<Json<VerificationStatusResponse>, VerifierError>
where
    S: OtpStore,
    N: Notifier + Clone + 'static,
{
    let uc = GetStatusUseCase {
        repo: state.store.clone(),
    };
    let is_verified = uc.execute(&email).await?;

    let email = match EmailAddress::parse(&email) {
        Ok(address) => address.to_string(),
        Err(_) => email.trim().to_lowercase(),
    };
    Ok(Json(VerificationStatusResponse {
        email,
        is_verified,
        message: if is_verified {
            "Email is verified"
        } else {
            "Email is not verified"
        },
    }))
}
