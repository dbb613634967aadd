use std::time::Duration;

use serde::Deserialize;

use mailotp_core::config::Config;
use mailotp_core::tracing::LogFormat;

use crate::infra::mailgun::MailgunSettings;

const DEFAULT_MAILGUN_BASE_URL: &str = "https://api.mailgun.net/v3";

/// Verifier service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// PostgreSQL connection URL. Unset runs on the in-memory store.
    pub database_url: Option<String>,
    /// TCP port for the HTTP server (default 8000). Env var: `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret for the `x-api-key` gate. Unset accepts any non-empty key.
    pub api_key: Option<String>,
    pub mailgun_api_key: Option<String>,
    pub mailgun_domain: Option<String>,
    #[serde(default = "default_mailgun_base_url")]
    pub mailgun_base_url: String,
    /// `From:` address on outgoing mail.
    #[serde(default = "default_sender_email")]
    pub sender_email: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Seconds between sweeps of expired records (default 3600).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// How long expired records are kept before the sweeper deletes them (default 86400).
    #[serde(default = "default_otp_retention_secs")]
    pub otp_retention_secs: u64,
}

fn default_port() -> u16 {
    8000
}

fn default_mailgun_base_url() -> String {
    DEFAULT_MAILGUN_BASE_URL.to_owned()
}

fn default_sender_email() -> String {
    "noreply@otpservice.com".to_owned()
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_otp_retention_secs() -> u64 {
    86_400
}

impl Config for VerifierConfig {}

impl VerifierConfig {
    /// Mailgun settings when both the key and domain are set and non-empty.
    pub fn mailgun(&self) -> Option<MailgunSettings> {
        let api_key = self.mailgun_api_key.as_deref().filter(|k| !k.is_empty())?;
        let domain = self.mailgun_domain.as_deref().filter(|d| !d.is_empty())?;
        Some(MailgunSettings {
            api_key: api_key.to_owned(),
            domain: domain.to_owned(),
            base_url: self.mailgun_base_url.clone(),
        })
    }

    /// Treats an empty `DATABASE_URL` as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Zero is clamped to one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn otp_retention(&self) -> Duration {
        Duration::from_secs(self.otp_retention_secs)
    }
}
