//! The run pipeline.
//!
//! Pure stages (resolve, reconcile, plan) are separated from the dispatch
//! stage so `gather_and_plan` can serve dry runs without touching the
//! update protocol.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use msync_catalog::{fetch_full_catalog, index_catalog, index_source, CatalogProvider};
use msync_config::{settings_hash, SyncSettings};
use msync_dispatch::{dispatch, plan, Batch, DispatchLimits, RetryPolicy, UpdateApi, UpdateOutcome};
use msync_feed::SourceProvider;
use msync_reconcile::{compute_updates, resolve, ReconcileOutput, SkuLookup};
use msync_schemas::FetchError;

use crate::report::{RunCounters, RunReport};

/// Everything known before any update is submitted.
#[derive(Clone, Debug)]
pub struct PlannedRun {
    pub output: ReconcileOutput,
    pub batches: Vec<Batch>,
    /// Catalog entries successfully paired with a SKU.
    pub resolved: u64,
}

/// Fetch both snapshots and compute the batched update plan.
///
/// Fails fast on any [`FetchError`]: reconciling against unknown or
/// partial truth must not produce updates.
pub fn gather_and_plan(
    source: &dyn SourceProvider,
    catalog: &dyn CatalogProvider,
    sku_lookup: &SkuLookup,
    settings: &SyncSettings,
) -> Result<PlannedRun, FetchError> {
    let items = source.fetch()?;
    info!(source = source.name(), items = items.len(), "source feed fetched");

    let entries = fetch_full_catalog(catalog)?;
    info!(
        catalog = catalog.name(),
        entries = entries.len(),
        "catalog snapshot fetched"
    );

    let source_index = index_source(&items);
    let catalog_index = index_catalog(&entries);

    let (pairs, resolve_issues) = resolve(&entries, &source_index, sku_lookup);
    let resolved = pairs.len() as u64;

    let mut output = compute_updates(&pairs, &catalog_index);
    let mut issues = resolve_issues;
    issues.append(&mut output.issues);
    output.issues = issues;

    // Settings are validated at load time; a zero bound here is a caller bug.
    let batches = plan(output.commands.clone(), settings.max_batch_size)
        .map_err(|e| FetchError::Config(e.to_string()))?;

    info!(
        commands = output.commands.len(),
        batches = batches.len(),
        zero_out = output.stats.zero_out,
        changed = output.stats.changed,
        noop_skipped = output.stats.noop_skipped,
        "update plan computed"
    );

    Ok(PlannedRun {
        output,
        batches,
        resolved,
    })
}

/// Execute one full reconciliation run and produce the report.
///
/// Only a fetch failure aborts; dispatch-level failures accumulate into
/// the report and downgrade the status to PARTIAL where applicable.
pub async fn run_sync(
    source: &dyn SourceProvider,
    catalog: &dyn CatalogProvider,
    sku_lookup: &SkuLookup,
    api: Arc<dyn UpdateApi>,
    settings: &SyncSettings,
) -> Result<RunReport, FetchError> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let config_hash =
        settings_hash(settings).map_err(|e| FetchError::Config(e.to_string()))?;
    info!(run_id = %run_id, config_hash = %config_hash, "run started");

    let planned = gather_and_plan(source, catalog, sku_lookup, settings)?;

    let policy = RetryPolicy {
        max_attempts: settings.max_attempts,
        base_delay: Duration::from_millis(settings.base_delay_ms),
        max_delay: Duration::from_millis(settings.max_delay_ms),
    };
    let limits = DispatchLimits {
        max_concurrent_batches: settings.max_concurrent_batches,
        deadline: settings.deadline_secs.map(Duration::from_secs),
    };

    let results = dispatch(planned.batches, Arc::clone(&api), policy, limits).await;

    let mut counters = RunCounters {
        resolved: planned.resolved,
        ..RunCounters::default()
    };
    counters.absorb_stats(&planned.output.stats);
    for issue in &planned.output.issues {
        counters.absorb_issue(issue);
    }
    for result in &results {
        counters.absorb_result(result);
    }

    let failures = results
        .into_iter()
        .filter(|r| r.outcome != UpdateOutcome::Applied)
        .collect();

    let report = RunReport {
        run_id,
        status: counters.derive_status(),
        source: source.name().to_string(),
        marketplace: api.name().to_string(),
        config_hash,
        started_at,
        finished_at: Utc::now(),
        counters,
        issues: planned.output.issues,
        failures,
        fatal_error: None,
    };

    info!(
        run_id = %report.run_id,
        status = report.status.as_str(),
        applied = report.counters.applied,
        rejected = report.counters.rejected,
        retry_exhausted = report.counters.retry_exhausted,
        "run finished"
    );

    Ok(report)
}
