//! Identity resolution: catalog listing -> source SKU.

use std::collections::BTreeMap;

use msync_schemas::{CatalogEntry, SalesModel, SourceItem};

use crate::types::{ReconcileIssue, ResolvedPair};

/// Pre-built listing_id -> SKU mapping from an external mapping source,
/// consulted when the marketplace does not return the SKU on the entry.
pub type SkuLookup = BTreeMap<String, String>;

/// Resolve every catalog entry to at most one [`ResolvedPair`].
///
/// Matching order for the source row:
/// 1. exact (sku, entry.sales_model) — a source that distinguishes channels
///    must match the channel exactly;
/// 2. wildcard (sku, None) — a channel-agnostic source row fans out to every
///    channel the catalog publishes for that SKU;
/// 3. no match — the pair carries `source_item: None` and will be zeroed.
///
/// Entries whose SKU cannot be determined at all are excluded and recorded
/// as [`ReconcileIssue::Unresolvable`]. Source rows with no catalog entry
/// are silently ignored: there is no listing to update.
///
/// Duplicate entries for one (listing_id, sales_model) — pagination overlap
/// hands us those — collapse to the last entry, same as the catalog index,
/// so at most one pair per key ever reaches the engine and the planner.
pub fn resolve(
    catalog: &[CatalogEntry],
    source_index: &BTreeMap<(String, Option<SalesModel>), SourceItem>,
    lookup: &SkuLookup,
) -> (Vec<ResolvedPair>, Vec<ReconcileIssue>) {
    let mut deduped: BTreeMap<(&str, SalesModel), &CatalogEntry> = BTreeMap::new();
    for entry in catalog {
        deduped.insert((entry.listing_id.as_str(), entry.sales_model), entry);
    }

    let mut pairs = Vec::with_capacity(deduped.len());
    let mut issues = Vec::new();

    for entry in deduped.into_values() {
        let sku = entry
            .sku
            .clone()
            .or_else(|| lookup.get(&entry.listing_id).cloned());

        let sku = match sku {
            Some(s) => s,
            None => {
                issues.push(ReconcileIssue::Unresolvable {
                    listing_id: entry.listing_id.clone(),
                    sales_model: entry.sales_model,
                });
                continue;
            }
        };

        let source_item = source_index
            .get(&(sku.clone(), Some(entry.sales_model)))
            .or_else(|| source_index.get(&(sku, None)))
            .cloned();

        pairs.push(ResolvedPair {
            listing_id: entry.listing_id.clone(),
            sales_model: entry.sales_model,
            source_item,
        });
    }

    (pairs, issues)
}
