use std::fmt;

use rand::RngExt;
use subtle::ConstantTimeEq;

use crate::domain::types::OTP_LEN;
use crate::error::VerifierError;

/// Longest address accepted (RFC 5321 path limit).
pub const MAX_ADDRESS_LEN: usize = 254;

const MAX_LOCAL_LEN: usize = 64;
const MAX_LABEL_LEN: usize = 63;
const LOCAL_SPECIALS: &[char] = &['@', '"', '(', ')', ',', ':', ';', '<', '>', '[', '\\', ']'];

// ── EmailAddress ─────────────────────────────────────────────────────────────

/// Normalized email address: trimmed and lower-cased. Two addresses that differ
/// only in case are the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Syntax check plus normalization. Deliberately narrower than RFC 5322:
    /// no quoted local parts, no IP-literal domains.
    pub fn parse(raw: &str) -> Result<Self, VerifierError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_ADDRESS_LEN {
            return Err(VerifierError::InvalidAddress);
        }
        let (local, domain) = trimmed
            .split_once('@')
            .ok_or(VerifierError::InvalidAddress)?;
        if !valid_local(local) || !valid_domain(domain) {
            return Err(VerifierError::InvalidAddress);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Wrap a value that was normalized before it was stored.
    pub(crate) fn from_stored(address: String) -> Self {
        Self(address)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn valid_local(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= MAX_LOCAL_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && !LOCAL_SPECIALS.contains(&c))
}

fn valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= MAX_LABEL_LEN
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

// ── OtpCode ──────────────────────────────────────────────────────────────────

/// Six ASCII digits. `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Accepts exactly six ASCII digits, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.len() == OTP_LEN && trimmed.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(trimmed.to_owned()))
    }

    /// Draw a code uniformly from 000000..=999999.
    ///
    /// `rand::rng()` is a ChaCha-based CSPRNG seeded and periodically reseeded
    /// from the operating system.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let n: u32 = rng.random_range(0..10u32.pow(OTP_LEN as u32));
        Self(format!("{n:0width$}", width = OTP_LEN))
    }

    pub(crate) fn from_stored(code: String) -> Self {
        Self(code)
    }

    /// Constant-time equality. Run time does not depend on how many digits match.
    pub fn matches(&self, candidate: &OtpCode) -> bool {
        self.0.as_bytes().ct_eq(candidate.0.as_bytes()).into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}
