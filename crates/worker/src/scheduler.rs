//! Periodic check evaluation.
//!
//! Every tick (and once at startup) the [`CheckScheduler`] lists all checks
//! and evaluates each one concurrently:
//!
//! read -> validate -> probe -> evaluate -> {audit append, persist} -> alert
//!
//! The audit append and the state write run concurrently and neither waits
//! on the other. The alert goes out only after the new state is persisted.
//! A check whose previous evaluation is still running is skipped for the
//! tick. Failures are contained to the one check and retried naturally on
//! the next tick.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uptime_core::check::CHECKS_COLLECTION;
use uptime_core::types::now_millis;
use uptime_core::{
    evaluate, validate_check, AuditRecord, HealthState, ProbeOutcome, ValidationError,
};
use uptime_notify::AlertDispatcher;
use uptime_store::{RecordStore, StoreError};

use crate::audit::AuditLogger;
use crate::lifecycle::WorkerHandle;
use crate::probe::Prober;

/// Default time between check passes.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Errors / reports
// ---------------------------------------------------------------------------

/// Why one check's evaluation stopped early.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Failed to read check: {0}")]
    Read(StoreError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to persist check state: {0}")]
    Persist(StoreError),
}

/// Result of one completed evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub outcome: ProbeOutcome,
    pub state: HealthState,
    pub transition: bool,
    pub alert_sent: bool,
}

/// Counters for one pass over all checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub listed: usize,
    pub evaluated: usize,
    pub skipped_in_flight: usize,
    pub invalid: usize,
    pub failed: usize,
    pub alerts: usize,
}

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

/// Ids of checks currently being evaluated.
#[derive(Debug, Default)]
struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    /// Claim `id`, or `None` if it is already being evaluated.
    fn try_claim(self: &Arc<Self>, id: &str) -> Option<InFlightGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.insert(id.to_string()).then(|| InFlightGuard {
            owner: Arc::clone(self),
            id: id.to_string(),
        })
    }

    fn contains(&self, id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

/// Releases its id when dropped, whether the evaluation succeeded, failed
/// or was aborted.
struct InFlightGuard {
    owner: Arc<InFlight>,
    id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

// ---------------------------------------------------------------------------
// CheckScheduler
// ---------------------------------------------------------------------------

/// Drives the per-check pipeline on a fixed interval.
///
/// Cheap to clone; every clone shares the same stores and in-flight set.
#[derive(Clone)]
pub struct CheckScheduler {
    records: Arc<dyn RecordStore>,
    audit: AuditLogger,
    prober: Arc<dyn Prober>,
    alerts: AlertDispatcher,
    in_flight: Arc<InFlight>,
    interval: Duration,
}

impl CheckScheduler {
    /// Create a scheduler with the default 60-second interval.
    pub fn new(
        records: Arc<dyn RecordStore>,
        audit: AuditLogger,
        prober: Arc<dyn Prober>,
        alerts: AlertDispatcher,
    ) -> Self {
        Self {
            records,
            audit,
            prober,
            alerts,
            in_flight: Arc::default(),
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Whether an evaluation of `check_id` is currently running.
    pub fn is_in_flight(&self, check_id: &str) -> bool {
        self.in_flight.contains(check_id)
    }

    /// Start the interval loop. The first pass runs immediately.
    pub fn spawn(self) -> WorkerHandle {
        WorkerHandle::spawn("check scheduler", move |cancel| async move {
            self.run(cancel).await;
        })
    }

    /// Run the interval loop until `cancel` is triggered, then wait for the
    /// passes already started to finish.
    ///
    /// Each pass runs in its own task, so a slow pass never delays the next
    /// tick; the in-flight guard keeps the two from evaluating the same check.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let passes = TaskTracker::new();

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Check scheduler started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(
                        running_passes = passes.len(),
                        "Check scheduler stopping",
                    );
                    break;
                }
                _ = ticker.tick() => {
                    let scheduler = self.clone();
                    passes.spawn(async move {
                        scheduler.run_pass().await;
                    });
                }
            }
        }

        passes.close();
        passes.wait().await;
    }

    /// Evaluate every listed check once, concurrently and without a cap.
    pub async fn run_pass(&self) -> PassSummary {
        let ids = match self.records.list(CHECKS_COLLECTION).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list checks");
                return PassSummary::default();
            }
        };

        let mut summary = PassSummary {
            listed: ids.len(),
            ..Default::default()
        };
        if ids.is_empty() {
            tracing::debug!("No checks to process");
            return summary;
        }

        let mut tasks = JoinSet::new();
        for id in ids {
            let Some(guard) = self.in_flight.try_claim(&id) else {
                tracing::debug!(check_id = %id, "Previous evaluation still running, skipping");
                summary.skipped_in_flight += 1;
                continue;
            };
            let scheduler = self.clone();
            tasks.spawn(async move {
                let _guard = guard;
                let result = scheduler.evaluate_check(&id).await;
                log_result(&id, &result);
                result
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => {
                    summary.evaluated += 1;
                    if report.alert_sent {
                        summary.alerts += 1;
                    }
                }
                Ok(Err(CheckError::Invalid(_))) => summary.invalid += 1,
                Ok(Err(_)) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Check evaluation task panicked");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            listed = summary.listed,
            evaluated = summary.evaluated,
            skipped_in_flight = summary.skipped_in_flight,
            invalid = summary.invalid,
            failed = summary.failed,
            alerts = summary.alerts,
            "Check pass complete",
        );
        summary
    }

    /// Run the full pipeline for one check.
    ///
    /// A failed state write is not retried here; the next tick starts over
    /// from the stored record.
    pub async fn evaluate_check(&self, check_id: &str) -> Result<CheckReport, CheckError> {
        let mut record = self
            .records
            .read(CHECKS_COLLECTION, check_id)
            .await
            .map_err(CheckError::Read)?;
        let check = validate_check(&record)?;
        let definition = &check.definition;

        let outcome = self.prober.probe(definition).await;
        let now = now_millis();
        let evaluation = evaluate(definition, &check.runtime, &outcome, now);
        evaluation.runtime.write_to(&mut record);

        let audit_record = AuditRecord {
            check: record.clone(),
            outcome: outcome.clone(),
            state: evaluation.runtime.state,
            alert: evaluation.transition,
            time: now,
        };

        let (logged, persisted) = tokio::join!(
            self.audit.append(&definition.id, &audit_record),
            self.records.update(CHECKS_COLLECTION, &definition.id, &record),
        );
        if let Err(e) = logged {
            tracing::warn!(check_id = %definition.id, error = %e, "Failed to append audit record");
        }
        persisted.map_err(CheckError::Persist)?;

        let alert_sent = if evaluation.transition {
            self.alerts
                .dispatch(definition, evaluation.runtime.state)
                .await
        } else {
            false
        };

        Ok(CheckReport {
            outcome,
            state: evaluation.runtime.state,
            transition: evaluation.transition,
            alert_sent,
        })
    }
}

fn log_result(check_id: &str, result: &Result<CheckReport, CheckError>) {
    match result {
        Ok(report) => tracing::debug!(
            check_id,
            state = %report.state,
            transition = report.transition,
            "Check evaluated",
        ),
        Err(e @ CheckError::Invalid(_)) => {
            tracing::warn!(check_id, error = %e, "Check is not properly formatted, skipping")
        }
        Err(e) => tracing::error!(check_id, error = %e, "Check evaluation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exclusive_until_released() {
        let in_flight = Arc::new(InFlight::default());

        let guard = in_flight.try_claim("a").expect("first claim succeeds");
        assert!(in_flight.try_claim("a").is_none());
        assert!(in_flight.try_claim("b").is_some());
        assert!(in_flight.contains("a"));

        drop(guard);
        assert!(!in_flight.contains("a"));
        assert!(in_flight.try_claim("a").is_some());
    }

    #[test]
    fn check_error_display() {
        let err = CheckError::Persist(StoreError::NotFound {
            collection: "checks".into(),
            id: "abc".into(),
        });
        assert_eq!(
            err.to_string(),
            "Failed to persist check state: Record not found: checks/abc"
        );
    }
}
