//! Best-effort alerting on check state transitions.

use std::sync::Arc;

use uptime_core::alert::alert_message;
use uptime_core::{CheckDefinition, HealthState};

use crate::gateway::MessageGateway;

/// Formats transition alerts and hands them to a [`MessageGateway`].
///
/// At most one send is attempted per call. Failures are logged and reported
/// through the return value; nothing is retried.
#[derive(Clone)]
pub struct AlertDispatcher {
    gateway: Arc<dyn MessageGateway>,
}

impl AlertDispatcher {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }

    /// Alert the check's owner that it is now `state`.
    ///
    /// Returns `true` if the gateway accepted the message.
    pub async fn dispatch(&self, definition: &CheckDefinition, state: HealthState) -> bool {
        let message = alert_message(definition, state);

        match self.gateway.send(&definition.owner_phone, &message).await {
            Ok(()) => {
                tracing::info!(check_id = %definition.id, %state, "Alert sent");
                true
            }
            Err(e) => {
                tracing::error!(
                    check_id = %definition.id,
                    %state,
                    error = %e,
                    "Alert delivery failed",
                );
                false
            }
        }
    }
}
