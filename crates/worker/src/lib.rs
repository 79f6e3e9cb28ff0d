//! `uptime-worker` library crate.
//!
//! Background engine of the uptime monitor: the [`CheckScheduler`] probes
//! every check on a fixed interval, and the [`RotationManager`] compacts
//! audit streams into compressed archives on a longer one. The binary
//! entrypoint lives in `main.rs`.

pub mod archive;
pub mod audit;
pub mod config;
pub mod lifecycle;
pub mod probe;
pub mod rotation;
pub mod scheduler;

pub use audit::AuditLogger;
pub use config::WorkerConfig;
pub use lifecycle::WorkerHandle;
pub use probe::{HttpProber, Prober};
pub use rotation::RotationManager;
pub use scheduler::{CheckScheduler, PassSummary};
