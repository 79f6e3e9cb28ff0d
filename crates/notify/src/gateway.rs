//! Messaging gateway port and its error type.

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for alert delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Destination or message rejected before any request was made.
    #[error("Invalid alert parameters: {0}")]
    InvalidParameters(&'static str),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a status other than 200/201.
    #[error("Gateway returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// MessageGateway
// ---------------------------------------------------------------------------

/// External messaging service.
///
/// `Ok` only means the transport accepted the message; there is no delivery
/// confirmation.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<(), GatewayError>;
}

/// Gateway that writes every message to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyGateway;

#[async_trait]
impl MessageGateway for LogOnlyGateway {
    async fn send(&self, destination: &str, message: &str) -> Result<(), GatewayError> {
        tracing::warn!(destination, message, "No SMS gateway configured, alert logged only");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
