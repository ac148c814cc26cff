//! Scenario: one bad batch never poisons the rest of the run.
//!
//! # Invariants under test (purely in-process, no network)
//!
//! 1. Per-item rejections leave every other command applied and the run
//!    SUCCESS: the marketplace gave a definitive answer for everything.
//! 2. A transport failure that survives every retry marks only its own
//!    batch exhausted and downgrades the run to PARTIAL.
//! 3. The report's failure list names exactly the commands that did not
//!    end as applied.

use std::sync::Arc;

use msync_config::SyncSettings;
use msync_dispatch::{TransportError, UpdateOutcome};
use msync_runtime::run_sync;
use msync_schemas::{RunStatus, SalesModel};
use msync_testkit::{feed_item, listing, PagedCatalog, RecordingApi, StaticSource};

fn settings(max_batch_size: usize, max_attempts: u32) -> SyncSettings {
    SyncSettings {
        max_batch_size,
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 2,
        max_concurrent_batches: 1,
        ..SyncSettings::default()
    }
}

/// Three drifted listings so every batch carries exactly one command.
fn drifted_three() -> (StaticSource, PagedCatalog) {
    let source = StaticSource::new(vec![
        feed_item("S1", 7, 10),
        feed_item("S2", 7, 10),
        feed_item("S3", 7, 10),
    ]);
    let catalog = PagedCatalog::single(vec![
        listing("S1", SalesModel::Default, 1, 10),
        listing("S2", SalesModel::Default, 1, 10),
        listing("S3", SalesModel::Default, 1, 10),
    ]);
    (source, catalog)
}

#[tokio::test]
async fn item_rejection_keeps_run_success_and_others_applied() {
    let (source, catalog) = drifted_three();
    let api = Arc::new(RecordingApi::applying().rejecting(&["S2"]));

    let report = run_sync(
        &source,
        &catalog,
        &Default::default(),
        api.clone(),
        &settings(1, 3),
    )
    .await
    .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.counters.applied, 2);
    assert_eq!(report.counters.rejected, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].command.listing_id, "S2");
    assert!(matches!(
        report.failures[0].outcome,
        UpdateOutcome::Rejected { .. }
    ));
    // Rejections are definitive: no batch is submitted twice.
    assert_eq!(api.submit_count(), 3);
}

#[tokio::test]
async fn exhausted_batch_downgrades_run_to_partial() {
    let (source, catalog) = drifted_three();
    // Batch 1 (listing S1) times out on every attempt; batches 2 and 3 are
    // reached only after its retries are spent, then apply cleanly.
    let api = Arc::new(RecordingApi::failing_first(2, TransportError::Timeout));

    let report = run_sync(
        &source,
        &catalog,
        &Default::default(),
        api.clone(),
        &settings(1, 2),
    )
    .await
    .unwrap();

    assert_eq!(report.status, RunStatus::Partial);
    assert_eq!(report.counters.retry_exhausted, 1);
    assert_eq!(report.counters.applied, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].command.listing_id, "S1");
    assert!(matches!(
        report.failures[0].outcome,
        UpdateOutcome::RetriedExhausted { .. }
    ));
}
