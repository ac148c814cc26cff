use serde::{Deserialize, Serialize};

use msync_schemas::{SalesModel, SourceItem};

/// A catalog entry joined with its source row, one per sales model.
///
/// `source_item: None` means the listing exists on the marketplace but the
/// source no longer carries it: the zero-out policy applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPair {
    pub listing_id: String,
    pub sales_model: SalesModel,
    pub source_item: Option<SourceItem>,
}

/// One stock/price correction to push to the marketplace.
///
/// For a zero-out the target price equals the current catalog price, so the
/// update clears availability without touching the price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub listing_id: String,
    pub sales_model: SalesModel,
    pub target_quantity: i64,
    pub target_price_micros: i64,
}

/// Per-item conditions recorded during resolution and reconciliation.
///
/// None of these abort the run; they are surfaced in the run report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileIssue {
    /// Catalog entry with no SKU on the entry and no lookup mapping.
    Unresolvable {
        listing_id: String,
        sales_model: SalesModel,
    },
    /// Source quantity was negative; clamped to zero (warning, not error).
    QuantityClamped {
        listing_id: String,
        sales_model: SalesModel,
        sku: String,
        got: i64,
    },
    /// Source price was non-positive; the item was excluded from updates.
    InvalidPrice {
        listing_id: String,
        sales_model: SalesModel,
        sku: String,
        price_micros: i64,
    },
}

/// Counters the engine maintains alongside the command stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Listings zeroed because the source no longer carries them.
    pub zero_out: u64,
    /// Listings whose quantity or price differed from the source.
    pub changed: u64,
    /// Listings already matching the source; no command emitted.
    pub noop_skipped: u64,
}

/// Result of one reconciliation pass: the ordered command stream plus
/// everything the report needs to explain what was and was not emitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutput {
    /// Sorted by (listing_id, sales_model).
    pub commands: Vec<UpdateCommand>,
    pub issues: Vec<ReconcileIssue>,
    pub stats: ReconcileStats,
}
