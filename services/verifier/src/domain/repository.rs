use std::future::Future;

use chrono::{DateTime, Utc};

use crate::domain::types::{Identity, IssuedCode, OtpRecord};
use crate::domain::validation::EmailAddress;
use crate::error::VerifierError;

// Methods return `impl Future + Send` rather than using `async fn` so generic
// callers (axum handlers) can prove their futures are `Send`. Implementations
// may still be written with `async fn`.

/// Ledger of one-time passcodes. Every mutation is serialized per address.
pub trait OtpRepository: Send + Sync {
    /// Retire every unconsumed record for `record.address` and insert `record`,
    /// creating the address's identity if absent. All of it commits or none of it.
    fn replace_active(
        &self,
        record: &OtpRecord,
    ) -> impl Future<Output = Result<(), VerifierError>> + Send;

    /// Newest unconsumed record for the address, expired or not.
    fn find_unconsumed(
        &self,
        address: &EmailAddress,
    ) -> impl Future<Output = Result<Option<OtpRecord>, VerifierError>> + Send;

    /// Mark `record` consumed and its identity verified in one step.
    ///
    /// Compare-and-swap on the consumed flag: returns `false` without changing
    /// anything when the record was already consumed or retired.
    fn consume(
        &self,
        record: &OtpRecord,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, VerifierError>> + Send;

    /// Delete records that expired before `before`. Returns how many were removed.
    fn purge_expired(
        &self,
        before: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, VerifierError>> + Send;
}

/// Verified flag per address.
pub trait IdentityRepository: Send + Sync {
    /// Read-only lookup; never creates a record.
    fn find(
        &self,
        address: &EmailAddress,
    ) -> impl Future<Output = Result<Option<Identity>, VerifierError>> + Send;

    fn get_or_create(
        &self,
        address: &EmailAddress,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Identity, VerifierError>> + Send;

    /// Idempotent; creates the identity (already verified) if absent.
    fn mark_verified(
        &self,
        address: &EmailAddress,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), VerifierError>> + Send;
}

/// Storage backing both the ledger and the identity store.
pub trait OtpStore: OtpRepository + IdentityRepository + Clone + 'static {}

impl<T> OtpStore for T where T: OtpRepository + IdentityRepository + Clone + 'static {}

/// Port for delivering an issued code to its address. Called by the HTTP layer
/// after issue returns, never while a store lock is held.
pub trait Notifier: Send + Sync {
    fn notify(&self, issued: &IssuedCode)
    -> impl Future<Output = Result<(), VerifierError>> + Send;
}
