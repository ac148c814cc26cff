//! Scenario: listings with no determinable SKU are reported, never updated.
//!
//! # Invariants under test (purely in-process, no network)
//!
//! 1. An entry with no SKU and no lookup mapping produces no command and one
//!    UNRESOLVABLE issue; the run ends PARTIAL.
//! 2. The lookup table rescues entries the marketplace returns unlabeled.

use std::sync::Arc;

use msync_config::SyncSettings;
use msync_reconcile::{ReconcileIssue, SkuLookup};
use msync_runtime::run_sync;
use msync_schemas::{RunStatus, SalesModel};
use msync_testkit::{feed_item, listing, unlabeled_listing, PagedCatalog, RecordingApi, StaticSource};

fn fast_settings() -> SyncSettings {
    SyncSettings {
        base_delay_ms: 1,
        max_delay_ms: 2,
        ..SyncSettings::default()
    }
}

#[tokio::test]
async fn unlabeled_listing_without_mapping_is_partial_with_issue() {
    let source = StaticSource::new(vec![feed_item("S1", 5, 10)]);
    let catalog = PagedCatalog::single(vec![
        listing("S1", SalesModel::Default, 1, 10),
        unlabeled_listing("L-mystery", SalesModel::Default, 9, 30),
    ]);
    let api = Arc::new(RecordingApi::applying());

    let report = run_sync(
        &source,
        &catalog,
        &SkuLookup::new(),
        api.clone(),
        &fast_settings(),
    )
    .await
    .unwrap();

    assert_eq!(report.status, RunStatus::Partial);
    assert_eq!(report.counters.unresolvable, 1);
    assert_eq!(report.counters.resolved, 1);
    assert_eq!(
        report.issues,
        vec![ReconcileIssue::Unresolvable {
            listing_id: "L-mystery".to_string(),
            sales_model: SalesModel::Default,
        }]
    );
    // The mystery listing is never touched, not even zeroed.
    assert_eq!(api.submissions(), vec![vec!["S1".to_string()]]);
}

#[tokio::test]
async fn lookup_table_rescues_unlabeled_listing() {
    let source = StaticSource::new(vec![feed_item("S1", 5, 10)]);
    let catalog = PagedCatalog::single(vec![unlabeled_listing(
        "L-777",
        SalesModel::Default,
        1,
        10,
    )]);
    let mut lookup = SkuLookup::new();
    lookup.insert("L-777".to_string(), "S1".to_string());
    let api = Arc::new(RecordingApi::applying());

    let report = run_sync(&source, &catalog, &lookup, api.clone(), &fast_settings())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.counters.unresolvable, 0);
    assert_eq!(report.counters.changed, 1);
    assert_eq!(api.submissions(), vec![vec!["L-777".to_string()]]);
}
