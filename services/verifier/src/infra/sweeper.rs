use std::time::Duration;

use mailotp_core::clock::Clock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::repository::OtpRepository;
use crate::usecase::purge::PurgeExpiredUseCase;

/// Periodically delete records that expired more than `retention` ago.
///
/// The first sweep runs one full `every` after startup. Failures are logged and
/// retried on the next tick.
pub fn spawn_sweeper<R, C>(
    repo: R,
    clock: C,
    every: Duration,
    retention: Duration,
) -> JoinHandle<()>
where
    R: OtpRepository + 'static,
    C: Clock + 'static,
{
    let usecase = PurgeExpiredUseCase { repo, clock };
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // `interval` fires immediately; skip that tick.
        ticker.tick().await;
        info!(
            every_secs = every.as_secs(),
            retention_secs = retention.as_secs(),
            "otp sweeper started"
        );
        loop {
            ticker.tick().await;
            match usecase.execute(retention).await {
                Ok(0) => debug!("otp sweep found nothing to purge"),
                Ok(purged) => info!(purged, "purged expired otp records"),
                Err(e) => warn!(error = ?e, "otp sweep failed"),
            }
        }
    })
}
