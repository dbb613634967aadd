use chrono::Duration;

use mailotp_core::clock::Clock;
use mailotp_testing::clock::ManualClock;
use mailotp_verifier::domain::repository::{IdentityRepository, OtpRepository};
use mailotp_verifier::domain::types::OTP_TTL_SECS;
use mailotp_verifier::error::VerifierError;
use mailotp_verifier::infra::memory::MemoryStore;
use mailotp_verifier::usecase::issue::{IssueOtpInput, IssueOtpUseCase};

use crate::helpers::{FailingStore, TEST_EMAIL, address, issue, issue_uc};

#[tokio::test]
async fn should_issue_six_digit_code_expiring_in_ten_minutes() {
    let store = MemoryStore::new();
    let clock = ManualClock::epoch();

    let issued = issue(&store, &clock, TEST_EMAIL).await;

    assert_eq!(issued.code.as_str().len(), 6);
    assert!(issued.code.as_str().bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(
        issued.expires_at,
        clock.now() + Duration::seconds(OTP_TTL_SECS)
    );

    let active = store.find_unconsumed(&address(TEST_EMAIL)).await.unwrap().unwrap();
    assert_eq!(active.code, issued.code);
    assert!(!active.consumed);
}

#[tokio::test]
async fn should_create_unverified_identity_on_first_issue() {
    let store = MemoryStore::new();
    let clock = ManualClock::epoch();

    issue(&store, &clock, TEST_EMAIL).await;

    let identity = store.find(&address(TEST_EMAIL)).await.unwrap().unwrap();
    assert!(!identity.verified);
}

#[tokio::test]
async fn should_retire_previous_code_on_reissue() {
    let store = MemoryStore::new();
    let clock = ManualClock::epoch();

    let first = issue(&store, &clock, TEST_EMAIL).await;
    clock.advance(Duration::seconds(30));
    let second = issue(&store, &clock, TEST_EMAIL).await;

    let records = store.records(&address(TEST_EMAIL));
    let unconsumed: Vec<_> = records.iter().filter(|r| !r.consumed).collect();
    assert_eq!(unconsumed.len(), 1, "exactly one unconsumed record expected");
    assert_eq!(unconsumed[0].code, second.code);
    assert!(second.expires_at > first.expires_at);
}

#[tokio::test]
async fn should_normalize_address_before_storing() {
    let store = MemoryStore::new();
    let clock = ManualClock::epoch();

    let issued = issue(&store, &clock, "  User@Example.COM ").await;

    assert_eq!(issued.address.as_str(), TEST_EMAIL);
    assert!(store.find_unconsumed(&address(TEST_EMAIL)).await.unwrap().is_some());
}

#[tokio::test]
async fn should_reject_invalid_address_without_touching_storage() {
    let store = MemoryStore::new();
    let clock = ManualClock::epoch();

    let result = issue_uc(&store, &clock)
        .execute(IssueOtpInput {
            email: "invalid-email".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(VerifierError::InvalidAddress)),
        "expected InvalidAddress, got {result:?}"
    );
    assert!(store.identities().is_empty());
}

#[tokio::test]
async fn should_propagate_storage_failure() {
    let uc = IssueOtpUseCase {
        repo: FailingStore,
        clock: ManualClock::epoch(),
    };

    let result = uc
        .execute(IssueOtpInput {
            email: TEST_EMAIL.to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(VerifierError::Storage(_))),
        "expected Storage, got {result:?}"
    );
}

#[tokio::test]
async fn should_keep_addresses_independent() {
    let store = MemoryStore::new();
    let clock = ManualClock::epoch();

    let a = issue(&store, &clock, "a@example.com").await;
    issue(&store, &clock, "b@example.com").await;

    let active = store.find_unconsumed(&address("a@example.com")).await.unwrap().unwrap();
    assert_eq!(active.code, a.code, "issuing for b must not retire a's code");
}
