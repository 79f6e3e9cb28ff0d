//! Uptime monitor domain types and pure logic.
//!
//! No I/O lives here: the validator, state evaluator and alert formatter are
//! plain functions so they can be shared by the worker and any tooling.

pub mod alert;
pub mod audit;
pub mod check;
pub mod error;
pub mod evaluator;
pub mod outcome;
pub mod types;

pub use audit::AuditRecord;
pub use check::{
    validate_check, CheckDefinition, CheckRuntimeState, HealthState, HttpMethod, Protocol,
    ValidCheck,
};
pub use error::ValidationError;
pub use evaluator::{evaluate, Evaluation};
pub use outcome::ProbeOutcome;
