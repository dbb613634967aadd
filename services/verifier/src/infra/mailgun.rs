use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::info;

use crate::domain::repository::Notifier;
use crate::domain::types::{IssuedCode, OTP_TTL_SECS};
use crate::error::VerifierError;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const SUBJECT: &str = "Your verification code";

/// Mailgun account used to send codes.
#[derive(Debug, Clone)]
pub struct MailgunSettings {
    pub api_key: String,
    pub domain: String,
    /// API root, e.g. `https://api.mailgun.net/v3`.
    pub base_url: String,
}

/// Delivers codes through the Mailgun messages API.
///
/// Without settings every `notify` fails with `DeliveryFailed`; the issued code
/// itself stays valid.
#[derive(Clone)]
pub struct MailgunNotifier {
    client: reqwest::Client,
    settings: Option<Arc<MailgunSettings>>,
    sender: String,
}

#[derive(Serialize)]
struct MailgunMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
    html: String,
}

impl MailgunNotifier {
    pub fn new(settings: Option<MailgunSettings>, sender: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .context("build mailgun http client")?;
        Ok(Self {
            client,
            settings: settings.map(Arc::new),
            sender,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }
}

fn messages_url(settings: &MailgunSettings) -> String {
    format!(
        "{}/{}/messages",
        settings.base_url.trim_end_matches('/'),
        settings.domain
    )
}

fn render_text(code: &str) -> String {
    let minutes = OTP_TTL_SECS / 60;
    format!(
        "Your verification code is: {code}\n\n\
         This code will expire in {minutes} minutes.\n\n\
         If you did not request this code, please ignore this email.\n"
    )
}

fn render_html(code: &str) -> String {
    let minutes = OTP_TTL_SECS / 60;
    format!(
        "<!DOCTYPE html><html><body>\
         <p>Your verification code is:</p>\
         <p style=\"font-size:32px;font-weight:bold;letter-spacing:5px\">{code}</p>\
         <p>This code will expire in {minutes} minutes.</p>\
         <p>If you did not request this code, please ignore this email.</p>\
         </body></html>"
    )
}

impl Notifier for MailgunNotifier {
    async fn notify(&self, issued: &IssuedCode) -> Result<(), VerifierError> {
        let Some(settings) = self.settings.as_deref() else {
            return Err(VerifierError::DeliveryFailed(anyhow!(
                "mail delivery is not configured (MAILGUN_API_KEY / MAILGUN_DOMAIN)"
            )));
        };

        let message = MailgunMessage {
            from: &self.sender,
            to: issued.address.as_str(),
            subject: SUBJECT,
            text: render_text(issued.code.as_str()),
            html: render_html(issued.code.as_str()),
        };
        let form = serde_qs::to_string(&message)
            .context("encode mailgun message")
            .map_err(VerifierError::DeliveryFailed)?;

        self.client
            .post(messages_url(settings))
            .basic_auth("api", Some(&settings.api_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("mailgun send")
            .map_err(VerifierError::DeliveryFailed)?;

        info!(address = %issued.address, "verification email sent");
        Ok(())
    }
}
