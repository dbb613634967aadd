use tracing::{debug, info};

use mailotp_core::clock::Clock;

use crate::domain::repository::OtpRepository;
use crate::domain::types::{OutcomeKind, VerifyOutcome};
use crate::domain::validation::{EmailAddress, OtpCode};
use crate::error::VerifierError;

pub struct VerifyOtpInput {
    pub email: String,
    pub code: String,
}

/// Check a candidate code against the address's active code.
///
/// Only a matching, unexpired, unconsumed code changes state: the record is
/// consumed and the identity marked verified together. Every other outcome
/// leaves storage untouched.
pub struct VerifyOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub repo: R,
    pub clock: C,
}

impl<R, C> VerifyOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<VerifyOutcome, VerifierError> {
        let address = EmailAddress::parse(&input.email)?;
        let outcome = self.check(&address, &input.code).await?;
        if outcome.is_success() {
            info!(%address, "otp verified");
        } else {
            debug!(%address, outcome = outcome.kind.as_str(), "otp rejected");
        }
        Ok(outcome)
    }

    async fn check(
        &self,
        address: &EmailAddress,
        candidate: &str,
    ) -> Result<VerifyOutcome, VerifierError> {
        let Some(candidate) = OtpCode::parse(candidate) else {
            return Ok(VerifyOutcome::rejected(OutcomeKind::MalformedCode));
        };

        let Some(record) = self.repo.find_unconsumed(address).await? else {
            return Ok(VerifyOutcome::rejected(OutcomeKind::NoActiveCode));
        };

        let now = self.clock.now();
        if !record.is_active(now) {
            return Ok(VerifyOutcome::rejected(OutcomeKind::Expired));
        }

        if !record.code.matches(&candidate) {
            return Ok(VerifyOutcome::rejected(OutcomeKind::Mismatch));
        }

        // Another request consumed or replaced the record since it was read.
        if !self.repo.consume(&record, now).await? {
            return Ok(VerifyOutcome::rejected(OutcomeKind::NoActiveCode));
        }

        Ok(VerifyOutcome::success())
    }
}
