use crate::check::{CheckDefinition, HealthState};

/// Human-readable alert text for a state change, e.g.
/// `Alert: Your check for GET http://example.com is currently down`.
pub fn alert_message(definition: &CheckDefinition, state: HealthState) -> String {
    format!(
        "Alert: Your check for {} {} is currently {}",
        definition.method.as_upper(),
        definition.target_url(),
        state
    )
}
