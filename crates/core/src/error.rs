/// A raw check record that cannot be scheduled.
///
/// Carries the record's id when it was readable, and the name of every
/// required field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Check {} has invalid fields: {}",
    .check_id.as_deref().unwrap_or("<unknown>"),
    .fields.join(", ")
)]
pub struct ValidationError {
    pub check_id: Option<String>,
    pub fields: Vec<&'static str>,
}
