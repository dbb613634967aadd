//! Shared building blocks for mailotp services: configuration loading, clocks,
//! health probes, HTTP middleware, serde helpers and tracing setup.

pub mod clock;
pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
