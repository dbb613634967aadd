//! Test utilities for mailotp services.
//!
//! Provides gate headers and a manually driven clock.
//! Import in `#[cfg(test)]` blocks and integration tests only, never in production code.

pub mod auth;
pub mod clock;
