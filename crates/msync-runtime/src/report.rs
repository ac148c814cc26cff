//! Run report: the sole externally observable summary of one run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use msync_dispatch::{UpdateOutcome, UpdateResult};
use msync_reconcile::{ReconcileIssue, ReconcileStats};
use msync_schemas::RunStatus;

/// Commutative counters: increment-only, so aggregation order (and batch
/// completion order under concurrent dispatch) cannot change the totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Catalog entries successfully paired with a SKU.
    pub resolved: u64,
    pub unresolvable: u64,
    pub zero_out: u64,
    pub changed: u64,
    pub noop_skipped: u64,
    pub invalid_price: u64,
    pub quantity_clamped: u64,
    pub applied: u64,
    pub rejected: u64,
    pub retry_exhausted: u64,
    pub skipped_deadline: u64,
}

impl RunCounters {
    pub fn absorb_stats(&mut self, stats: &ReconcileStats) {
        self.zero_out += stats.zero_out;
        self.changed += stats.changed;
        self.noop_skipped += stats.noop_skipped;
    }

    pub fn absorb_issue(&mut self, issue: &ReconcileIssue) {
        match issue {
            ReconcileIssue::Unresolvable { .. } => self.unresolvable += 1,
            ReconcileIssue::QuantityClamped { .. } => self.quantity_clamped += 1,
            ReconcileIssue::InvalidPrice { .. } => self.invalid_price += 1,
        }
    }

    pub fn absorb_result(&mut self, result: &UpdateResult) {
        match &result.outcome {
            UpdateOutcome::Applied => self.applied += 1,
            UpdateOutcome::Rejected { .. } => self.rejected += 1,
            UpdateOutcome::RetriedExhausted { .. } => self.retry_exhausted += 1,
            UpdateOutcome::SkippedDeadline => self.skipped_deadline += 1,
        }
    }

    /// SUCCESS unless something was left undone: unresolvable entries,
    /// exhausted batches, or deadline skips downgrade the run to PARTIAL.
    /// Item-level rejections alone stay SUCCESS — the marketplace gave a
    /// definitive answer for every command.
    pub fn derive_status(&self) -> RunStatus {
        if self.unresolvable > 0 || self.retry_exhausted > 0 || self.skipped_deadline > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Success
        }
    }
}

/// Full report for one run, JSON-serializable for the CLI.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    /// Source provider name (e.g. `"csv-feed"`).
    pub source: String,
    /// Marketplace / update-protocol name (e.g. `"ozon"`).
    pub marketplace: String,
    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counters: RunCounters,
    /// Per-item conditions recorded during resolution and reconciliation.
    pub issues: Vec<ReconcileIssue>,
    /// Every dispatched command that did not end as APPLIED.
    pub failures: Vec<UpdateResult>,
    /// Present only for FAILED runs: the fatal fetch error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl RunReport {
    /// Report for a run aborted by a fatal fetch error: no updates were
    /// attempted, all counters zero.
    pub fn failed(
        run_id: String,
        source: String,
        marketplace: String,
        config_hash: String,
        started_at: DateTime<Utc>,
        error: String,
    ) -> Self {
        Self {
            run_id,
            status: RunStatus::Failed,
            source,
            marketplace,
            config_hash,
            started_at,
            finished_at: Utc::now(),
            counters: RunCounters::default(),
            issues: Vec::new(),
            failures: Vec::new(),
            fatal_error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msync_reconcile::UpdateCommand;
    use msync_schemas::SalesModel;

    fn result(outcome: UpdateOutcome) -> UpdateResult {
        UpdateResult {
            command: UpdateCommand {
                listing_id: "L1".to_string(),
                sales_model: SalesModel::Default,
                target_quantity: 0,
                target_price_micros: 1_000_000,
            },
            outcome,
        }
    }

    #[test]
    fn status_success_with_only_rejections() {
        let mut c = RunCounters::default();
        c.absorb_result(&result(UpdateOutcome::Applied));
        c.absorb_result(&result(UpdateOutcome::Rejected {
            detail: "nope".to_string(),
        }));
        assert_eq!(c.derive_status(), RunStatus::Success);
    }

    #[test]
    fn status_partial_on_retry_exhausted() {
        let mut c = RunCounters::default();
        c.absorb_result(&result(UpdateOutcome::RetriedExhausted {
            detail: "timeout".to_string(),
        }));
        assert_eq!(c.derive_status(), RunStatus::Partial);
    }

    #[test]
    fn status_partial_on_unresolvable() {
        let mut c = RunCounters::default();
        c.absorb_issue(&ReconcileIssue::Unresolvable {
            listing_id: "L1".to_string(),
            sales_model: SalesModel::Default,
        });
        assert_eq!(c.derive_status(), RunStatus::Partial);
    }

    #[test]
    fn status_partial_on_deadline_skip() {
        let mut c = RunCounters::default();
        c.absorb_result(&result(UpdateOutcome::SkippedDeadline));
        assert_eq!(c.derive_status(), RunStatus::Partial);
    }

    #[test]
    fn counters_are_commutative_across_absorption_order() {
        let results = vec![
            result(UpdateOutcome::Applied),
            result(UpdateOutcome::SkippedDeadline),
            result(UpdateOutcome::Rejected {
                detail: "x".to_string(),
            }),
        ];
        let mut forward = RunCounters::default();
        for r in &results {
            forward.absorb_result(r);
        }
        let mut backward = RunCounters::default();
        for r in results.iter().rev() {
            backward.absorb_result(r);
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn failed_report_has_zero_counters_and_error() {
        let report = RunReport::failed(
            "run-1".to_string(),
            "csv-feed".to_string(),
            "ozon".to_string(),
            "hash".to_string(),
            Utc::now(),
            "transport error: connection refused".to_string(),
        );
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.counters, RunCounters::default());
        assert!(report.fatal_error.is_some());
    }
}
