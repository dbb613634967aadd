use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::validation::{EmailAddress, OtpCode};

/// Verification state of one email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub address: EmailAddress,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(address: EmailAddress, now: DateTime<Utc>) -> Self {
        Self {
            address,
            verified: false,
            created_at: now,
        }
    }
}

/// A passcode issued to an address. Active while unconsumed and unexpired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: Uuid,
    pub address: EmailAddress,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && self.expires_at > now
    }
}

/// Result of a successful issue, handed to the notifier by the caller.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub address: EmailAddress,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
}

/// Classification of a verify attempt. Only `Success` changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    NoActiveCode,
    Expired,
    Mismatch,
    MalformedCode,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoActiveCode => "no_active_code",
            Self::Expired => "expired",
            Self::Mismatch => "mismatch",
            Self::MalformedCode => "malformed_code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub kind: OutcomeKind,
    /// True when this call verified the identity.
    pub now_verified: bool,
}

impl VerifyOutcome {
    pub fn success() -> Self {
        Self {
            kind: OutcomeKind::Success,
            now_verified: true,
        }
    }

    pub fn rejected(kind: OutcomeKind) -> Self {
        Self {
            kind,
            now_verified: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}

/// Code length in digits.
pub const OTP_LEN: usize = 6;

/// Code time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 600;
