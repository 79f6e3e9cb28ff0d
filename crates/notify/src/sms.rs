//! SMS delivery via the Twilio REST API.
//!
//! [`TwilioSmsGateway`] posts a form-encoded message to the account's
//! `Messages.json` endpoint. Configuration is loaded from environment
//! variables; if any Twilio credential is missing, [`SmsConfig::from_env`]
//! returns `None` and the caller should fall back to
//! [`LogOnlyGateway`](crate::gateway::LogOnlyGateway).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::gateway::{GatewayError, MessageGateway};

/// Production API host. Overridable for testing via `TWILIO_API_BASE`.
const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Destinations are ten-digit North American numbers.
const PHONE_LEN: usize = 10;

/// Twilio rejects bodies at or above this length.
const MAX_BODY_CHARS: usize = 1600;

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Credentials and sender number for the Twilio gateway.
#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form, e.g. `+15005550006`.
    pub from_phone: String,
    pub api_base: String,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless all three credentials are set.
    ///
    /// | Variable             | Required | Default                  |
    /// |----------------------|----------|--------------------------|
    /// | `TWILIO_ACCOUNT_SID` | yes      | (none)                   |
    /// | `TWILIO_AUTH_TOKEN`  | yes      | (none)                   |
    /// | `TWILIO_FROM_PHONE`  | yes      | (none)                   |
    /// | `TWILIO_API_BASE`    | no       | `https://api.twilio.com` |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok()?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok()?,
            from_phone: std::env::var("TWILIO_FROM_PHONE").ok()?,
            api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_phone", &self.from_phone)
            .field("api_base", &self.api_base)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TwilioSmsGateway
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SmsForm<'a> {
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Body")]
    body: &'a str,
}

/// Sends alerts as SMS messages.
pub struct TwilioSmsGateway {
    client: reqwest::Client,
    config: SmsConfig,
}

impl TwilioSmsGateway {
    pub fn new(config: SmsConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MessageGateway for TwilioSmsGateway {
    async fn send(&self, destination: &str, message: &str) -> Result<(), GatewayError> {
        let phone = destination.trim();
        if phone.len() != PHONE_LEN {
            return Err(GatewayError::InvalidParameters(
                "destination must be a 10-digit phone number",
            ));
        }
        let body = message.trim();
        if body.is_empty() || body.chars().count() >= MAX_BODY_CHARS {
            return Err(GatewayError::InvalidParameters(
                "message must be between 1 and 1599 characters",
            ));
        }

        let form = SmsForm {
            from: &self.config.from_phone,
            to: format!("+1{phone}"),
            body,
        };

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        match response.status().as_u16() {
            200 | 201 => Ok(()),
            status => Err(GatewayError::HttpStatus(status)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
