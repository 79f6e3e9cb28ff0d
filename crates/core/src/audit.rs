//! Audit record appended to a check's log stream after every evaluation.

use serde::{Deserialize, Serialize};

use crate::check::HealthState;
use crate::outcome::ProbeOutcome;
use crate::types::UnixMillis;

/// One self-contained line of a check's audit stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Snapshot of the check record as written back after this evaluation.
    pub check: serde_json::Value,
    pub outcome: ProbeOutcome,
    pub state: HealthState,
    /// Whether this evaluation was a transition worth alerting on.
    pub alert: bool,
    pub time: UnixMillis,
}

impl AuditRecord {
    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
