//! The single terminal result of one probe.

use serde::{Deserialize, Serialize};

/// Outcome of one probe attempt.
///
/// Exactly one value is produced per probe. Serialized with a `kind` tag so
/// audit lines stay self-describing:
/// `{"kind":"success","responseCode":200}`,
/// `{"kind":"networkError","detail":"..."}`, `{"kind":"timeout"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProbeOutcome {
    /// The target answered with a status line.
    Success {
        #[serde(rename = "responseCode")]
        response_code: u16,
    },
    /// Connection, DNS, TLS or protocol failure before a status was received.
    NetworkError { detail: String },
    /// No status received before the check's deadline.
    Timeout,
}

impl ProbeOutcome {
    pub fn response_code(&self) -> Option<u16> {
        match self {
            Self::Success { response_code } => Some(*response_code),
            _ => None,
        }
    }
}
