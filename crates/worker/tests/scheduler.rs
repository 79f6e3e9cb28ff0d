mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use uptime_core::{HealthState, ProbeOutcome};
use uptime_notify::AlertDispatcher;
use uptime_store::{LogStore, MemoryLogStore, MemoryRecordStore, RecordStore, StoreError};
use uptime_worker::scheduler::CheckError;
use uptime_worker::{AuditLogger, CheckScheduler, PassSummary};

use common::{
    check_record, BrokenLogs, GatedProber, Harness, ReadOnlyRecords, RecordingGateway,
    ScriptedProber, CHECK_ID, OWNER_PHONE,
};

// ---------------------------------------------------------------------------
// Single evaluation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_evaluation_sets_state_without_alert() {
    let h = Harness::new(ScriptedProber::codes(&[503]));
    h.records.insert("checks", CHECK_ID, check_record(CHECK_ID, &[200])).await;

    let report = h.scheduler.evaluate_check(CHECK_ID).await.unwrap();

    assert_eq!(report.state, HealthState::Down);
    assert!(!report.transition);
    assert!(!report.alert_sent);
    assert!(h.gateway.messages().is_empty());

    let stored = h.stored(CHECK_ID).await;
    assert_eq!(stored["state"], "down");
    assert!(stored["lastChecked"].as_i64().unwrap() > 0);
    assert_eq!(stored["userPhone"], OWNER_PHONE, "other fields are preserved");
}

#[tokio::test]
async fn every_evaluation_is_audited() {
    let h = Harness::new(ScriptedProber::new([
        ProbeOutcome::Success { response_code: 200 },
        ProbeOutcome::NetworkError {
            detail: "connection refused".into(),
        },
    ]));
    h.records.insert("checks", CHECK_ID, check_record(CHECK_ID, &[200])).await;

    h.scheduler.evaluate_check(CHECK_ID).await.unwrap();
    h.scheduler.evaluate_check(CHECK_ID).await.unwrap();

    let lines = h.audit_lines(CHECK_ID).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["state"], "up");
    assert_eq!(lines[0]["alert"], false);
    assert_eq!(lines[1]["state"], "down");
    assert_eq!(lines[1]["alert"], true);
    assert_eq!(
        lines[1]["outcome"],
        json!({"kind": "networkError", "detail": "connection refused"})
    );
    assert_eq!(lines[1]["check"]["state"], "down");
}

#[tokio::test]
async fn invalid_check_is_never_probed() {
    let h = Harness::new(ScriptedProber::codes(&[200]));
    let mut record = check_record(CHECK_ID, &[200]);
    record["timeoutSeconds"] = json!(9);
    h.records.insert("checks", CHECK_ID, record.clone()).await;

    assert_matches!(
        h.scheduler.evaluate_check(CHECK_ID).await,
        Err(CheckError::Invalid(e)) if e.fields == vec!["timeoutSeconds"]
    );
    assert_eq!(h.prober.calls(), 0);
    assert_eq!(h.stored(CHECK_ID).await, record);
    assert!(h.audit_lines(CHECK_ID).await.is_empty());
}

#[tokio::test]
async fn missing_record_is_a_read_error() {
    let h = Harness::new(ScriptedProber::codes(&[200]));
    assert_matches!(
        h.scheduler.evaluate_check(CHECK_ID).await,
        Err(CheckError::Read(StoreError::NotFound { .. }))
    );
    assert_eq!(h.prober.calls(), 0);
}

#[tokio::test]
async fn persist_failure_suppresses_alert() {
    let mut record = check_record(CHECK_ID, &[200]);
    record["state"] = json!("up");
    record["lastChecked"] = json!(1_700_000_000_000_i64);
    let inner = MemoryRecordStore::new();
    inner.insert("checks", CHECK_ID, record).await;

    let logs = Arc::new(MemoryLogStore::new());
    let gateway = Arc::new(RecordingGateway::default());
    let scheduler = CheckScheduler::new(
        Arc::new(ReadOnlyRecords(inner)),
        AuditLogger::new(logs.clone()),
        Arc::new(ScriptedProber::codes(&[500])),
        AlertDispatcher::new(gateway.clone()),
    );

    assert_matches!(
        scheduler.evaluate_check(CHECK_ID).await,
        Err(CheckError::Persist(_))
    );
    assert!(gateway.messages().is_empty());
    // The audit append is independent of the failed write.
    assert_eq!(logs.read_raw(CHECK_ID).await.unwrap().lines().count(), 1);
}

#[tokio::test]
async fn audit_failure_does_not_block_persist_or_alert() {
    let mut record = check_record(CHECK_ID, &[200]);
    record["state"] = json!("up");
    record["lastChecked"] = json!(1_700_000_000_000_i64);
    let records = Arc::new(MemoryRecordStore::new());
    records.insert("checks", CHECK_ID, record).await;

    let gateway = Arc::new(RecordingGateway::default());
    let scheduler = CheckScheduler::new(
        records.clone(),
        AuditLogger::new(Arc::new(BrokenLogs)),
        Arc::new(ScriptedProber::new([ProbeOutcome::Timeout])),
        AlertDispatcher::new(gateway.clone()),
    );

    let report = scheduler.evaluate_check(CHECK_ID).await.unwrap();
    assert!(report.transition);
    assert!(report.alert_sent);
    assert_eq!(gateway.destinations(), vec![OWNER_PHONE]);

    assert_eq!(records.read("checks", CHECK_ID).await.unwrap()["state"], "down");
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pass_counts_each_check() {
    let h = Harness::new(ScriptedProber::codes(&[200, 200]));
    for id in ["a".repeat(20), "b".repeat(20)] {
        h.records.insert("checks", &id, check_record(&id, &[200])).await;
    }
    h.records
        .insert("checks", "broken", json!({"id": "broken"}))
        .await;

    let summary = h.scheduler.run_pass().await;
    assert_eq!(
        summary,
        PassSummary {
            listed: 3,
            evaluated: 2,
            invalid: 1,
            ..Default::default()
        }
    );
    assert_eq!(h.prober.calls(), 2);
}

#[tokio::test]
async fn empty_store_is_a_no_op() {
    let h = Harness::new(ScriptedProber::default());
    assert_eq!(h.scheduler.run_pass().await, PassSummary::default());
}

#[tokio::test]
async fn check_still_in_flight_is_skipped() {
    let h = Harness::new(GatedProber::default());
    h.records.insert("checks", CHECK_ID, check_record(CHECK_ID, &[200])).await;

    let first = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.run_pass().await }
    });
    h.prober.started.notified().await;
    assert!(h.scheduler.is_in_flight(CHECK_ID));

    let second = h.scheduler.run_pass().await;
    assert_eq!(second.skipped_in_flight, 1);
    assert_eq!(second.evaluated, 0);
    assert_eq!(h.prober.calls(), 1);

    h.prober.release();
    let first = first.await.unwrap();
    assert_eq!(first.evaluated, 1);
    assert!(!h.scheduler.is_in_flight(CHECK_ID));

    // Released checks are picked up again by the next pass.
    let third = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.run_pass().await }
    });
    h.prober.started.notified().await;
    h.prober.release();
    let third = third.await.unwrap();
    assert_eq!(third.evaluated, 1);
    assert_eq!(third.skipped_in_flight, 0);
    assert_eq!(h.prober.calls(), 2);
}

// ---------------------------------------------------------------------------
// Interval loop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn loop_runs_immediately_then_every_interval() {
    let h = Harness::new(ScriptedProber::codes(&[200, 200, 200, 200]));
    h.records.insert("checks", CHECK_ID, check_record(CHECK_ID, &[200])).await;

    let handle = h.scheduler.clone().with_interval(Duration::from_secs(60)).spawn();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.prober.calls(), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.prober.calls(), 3);

    handle.stop().await;
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(h.prober.calls(), 3);
}

#[tokio::test]
async fn stop_waits_for_running_evaluation() {
    let h = Harness::new(GatedProber::default());
    h.records.insert("checks", CHECK_ID, check_record(CHECK_ID, &[200])).await;

    let handle = h.scheduler.clone().spawn();
    h.prober.started.notified().await;

    let stopping = tokio::spawn(handle.stop());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!stopping.is_finished(), "stop returned while a check was running");

    h.prober.release();
    stopping.await.unwrap();

    let stored = h.stored(CHECK_ID).await;
    assert_eq!(stored["state"], "up");
    assert_eq!(h.audit_lines(CHECK_ID).await.len(), 1);
    assert!(!h.scheduler.is_in_flight(CHECK_ID));
}
