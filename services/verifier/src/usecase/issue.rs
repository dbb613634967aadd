use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use mailotp_core::clock::Clock;

use crate::domain::repository::OtpRepository;
use crate::domain::types::{IssuedCode, OTP_TTL_SECS, OtpRecord};
use crate::domain::validation::{EmailAddress, OtpCode};
use crate::error::VerifierError;

pub struct IssueOtpInput {
    pub email: String,
}

/// Issue a fresh code for an address, retiring whatever code it had before.
///
/// Delivery is the caller's job; the returned code is already active.
pub struct IssueOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub repo: R,
    pub clock: C,
}

impl<R, C> IssueOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<IssuedCode, VerifierError> {
        let address = EmailAddress::parse(&input.email)?;

        let now = self.clock.now();
        let record = OtpRecord {
            id: Uuid::now_v7(),
            address,
            code: OtpCode::generate(),
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
            consumed: false,
            created_at: now,
        };

        self.repo.replace_active(&record).await?;

        info!(address = %record.address, expires_at = %record.expires_at, "otp issued");
        Ok(IssuedCode {
            address: record.address,
            code: record.code,
            expires_at: record.expires_at,
        })
    }
}
