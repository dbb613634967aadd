//! Gate helpers for integration tests.
//!
//! Protected routes expect an `x-api-key` header checked by
//! `mailotp_core::middleware::require_api_key`. `MockApiKey` produces that header.

use axum::http::{HeaderName, HeaderValue};
use mailotp_core::middleware::X_API_KEY;

/// API key configured on test servers.
pub const TEST_API_KEY: &str = "test-api-key";

/// Configurable key presented by test requests.
pub struct MockApiKey {
    pub key: String,
}

impl MockApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The key test servers are configured with.
    pub fn valid() -> Self {
        Self::new(TEST_API_KEY)
    }

    pub fn header(&self) -> (HeaderName, HeaderValue) {
        (X_API_KEY, HeaderValue::from_str(&self.key).unwrap())
    }
}
