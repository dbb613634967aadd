use std::time::Duration;

use mailotp_core::clock::Clock;

use crate::domain::repository::OtpRepository;
use crate::error::VerifierError;

/// Delete records whose expiry lies more than `retention` in the past.
pub struct PurgeExpiredUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub repo: R,
    pub clock: C,
}

impl<R, C> PurgeExpiredUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self, retention: Duration) -> Result<u64, VerifierError> {
        let retention = chrono::Duration::from_std(retention)
            .map_err(|e| VerifierError::Storage(e.into()))?;
        let cutoff = self.clock.now() - retention;
        self.repo.purge_expired(cutoff).await
    }
}
