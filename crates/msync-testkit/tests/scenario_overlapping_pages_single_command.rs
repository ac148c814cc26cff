//! Scenario: catalog pagination overlap must not duplicate updates.
//!
//! # Invariants under test (purely in-process, no network)
//!
//! 1. A listing returned on two catalog pages yields exactly one command
//!    for its (listing_id, sales_model) key.
//! 2. The later page's snapshot wins: an already-reconciled duplicate on
//!    the second page makes the whole run a no-op.

use std::sync::Arc;

use msync_config::SyncSettings;
use msync_runtime::run_sync;
use msync_schemas::{RunStatus, SalesModel};
use msync_testkit::{feed_item, listing, PagedCatalog, RecordingApi, StaticSource};

fn fast_settings() -> SyncSettings {
    SyncSettings {
        base_delay_ms: 1,
        max_delay_ms: 2,
        ..SyncSettings::default()
    }
}

#[tokio::test]
async fn listing_on_two_pages_is_updated_once() {
    let source = StaticSource::new(vec![feed_item("S1", 7, 100)]);
    // Page overlap: the marketplace hands back S1 on both pages.
    let catalog = PagedCatalog::new(vec![
        vec![
            listing("S1", SalesModel::Default, 2, 100),
            listing("S2", SalesModel::Default, 0, 50),
        ],
        vec![listing("S1", SalesModel::Default, 2, 100)],
    ]);
    let api = Arc::new(RecordingApi::applying());

    let report = run_sync(&source, &catalog, &Default::default(), api.clone(), &fast_settings())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.counters.changed, 1);
    assert_eq!(report.counters.applied, 1);

    let submissions = api.submissions();
    let submitted: Vec<&str> = submissions
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();
    assert_eq!(submitted, vec!["S1"], "one command per key, ever");
}

#[tokio::test]
async fn later_duplicate_snapshot_wins() {
    let source = StaticSource::new(vec![feed_item("S1", 7, 100)]);
    // The first page is stale; the second already matches the feed.
    let catalog = PagedCatalog::new(vec![
        vec![listing("S1", SalesModel::Default, 2, 100)],
        vec![listing("S1", SalesModel::Default, 7, 100)],
    ]);
    let api = Arc::new(RecordingApi::applying());

    let report = run_sync(&source, &catalog, &Default::default(), api.clone(), &fast_settings())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.counters.noop_skipped, 1);
    assert_eq!(api.submit_count(), 0);
}
