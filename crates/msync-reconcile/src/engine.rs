//! Reconciliation engine: resolved pairs -> minimal update set.

use std::collections::BTreeMap;

use msync_schemas::{CatalogEntry, SalesModel};

use crate::types::{ReconcileIssue, ReconcileOutput, ResolvedPair, UpdateCommand};

/// Compute the minimal ordered set of updates for one run.
///
/// Per pair:
/// - absent source row: zero out quantity, keep the current price; suppress
///   when the listing is already at zero (a second run with unchanged input
///   must emit nothing);
/// - present source row: take quantity and price from the source; suppress
///   when both already match the catalog;
/// - negative source quantities clamp to 0 with a recorded warning;
/// - non-positive source prices exclude the item with a recorded issue.
///
/// Output is sorted by (listing_id, sales_model) so batch boundaries and
/// logs are reproducible for identical input.
pub fn compute_updates(
    pairs: &[ResolvedPair],
    catalog_index: &BTreeMap<(String, SalesModel), CatalogEntry>,
) -> ReconcileOutput {
    let mut out = ReconcileOutput::default();

    for pair in pairs {
        let key = (pair.listing_id.clone(), pair.sales_model);
        let entry = match catalog_index.get(&key) {
            Some(e) => e,
            None => {
                // A pair the index does not know cannot be diffed; surface it
                // the same way as a failed SKU resolution.
                out.issues.push(ReconcileIssue::Unresolvable {
                    listing_id: pair.listing_id.clone(),
                    sales_model: pair.sales_model,
                });
                continue;
            }
        };

        match &pair.source_item {
            None => {
                if entry.current_quantity != 0 {
                    out.commands.push(UpdateCommand {
                        listing_id: pair.listing_id.clone(),
                        sales_model: pair.sales_model,
                        target_quantity: 0,
                        target_price_micros: entry.current_price_micros,
                    });
                    out.stats.zero_out += 1;
                } else {
                    out.stats.noop_skipped += 1;
                }
            }
            Some(item) => {
                if item.price_micros <= 0 {
                    out.issues.push(ReconcileIssue::InvalidPrice {
                        listing_id: pair.listing_id.clone(),
                        sales_model: pair.sales_model,
                        sku: item.sku.clone(),
                        price_micros: item.price_micros,
                    });
                    continue;
                }

                let mut target_quantity = item.quantity;
                if target_quantity < 0 {
                    out.issues.push(ReconcileIssue::QuantityClamped {
                        listing_id: pair.listing_id.clone(),
                        sales_model: pair.sales_model,
                        sku: item.sku.clone(),
                        got: target_quantity,
                    });
                    target_quantity = 0;
                }

                if target_quantity != entry.current_quantity
                    || item.price_micros != entry.current_price_micros
                {
                    out.commands.push(UpdateCommand {
                        listing_id: pair.listing_id.clone(),
                        sales_model: pair.sales_model,
                        target_quantity,
                        target_price_micros: item.price_micros,
                    });
                    out.stats.changed += 1;
                } else {
                    out.stats.noop_skipped += 1;
                }
            }
        }
    }

    out.commands
        .sort_by(|a, b| (&a.listing_id, a.sales_model).cmp(&(&b.listing_id, b.sales_model)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use msync_schemas::SourceItem;

    fn entry(listing_id: &str, model: SalesModel, qty: i64, price_micros: i64) -> CatalogEntry {
        CatalogEntry {
            listing_id: listing_id.to_string(),
            sku: Some(format!("sku-{listing_id}")),
            sales_model: model,
            current_quantity: qty,
            current_price_micros: price_micros,
        }
    }

    fn item(sku: &str, quantity: i64, price_micros: i64) -> SourceItem {
        SourceItem {
            sku: sku.to_string(),
            quantity,
            price_micros,
            sales_model: None,
        }
    }

    fn pair(listing_id: &str, model: SalesModel, source: Option<SourceItem>) -> ResolvedPair {
        ResolvedPair {
            listing_id: listing_id.to_string(),
            sales_model: model,
            source_item: source,
        }
    }

    fn index(entries: &[CatalogEntry]) -> BTreeMap<(String, SalesModel), CatalogEntry> {
        entries
            .iter()
            .map(|e| ((e.listing_id.clone(), e.sales_model), e.clone()))
            .collect()
    }

    #[test]
    fn absent_source_zeroes_quantity_and_keeps_price() {
        // catalog L1 qty=5 price=10.0, source empty.
        let idx = index(&[entry("L1", SalesModel::Default, 5, 10_000_000)]);
        let out = compute_updates(&[pair("L1", SalesModel::Default, None)], &idx);
        assert_eq!(
            out.commands,
            vec![UpdateCommand {
                listing_id: "L1".to_string(),
                sales_model: SalesModel::Default,
                target_quantity: 0,
                target_price_micros: 10_000_000,
            }]
        );
        assert_eq!(out.stats.zero_out, 1);
        assert_eq!(out.stats.changed, 0);
    }

    #[test]
    fn already_zero_listing_is_not_rezeroed() {
        let idx = index(&[entry("L1", SalesModel::Default, 0, 10_000_000)]);
        let out = compute_updates(&[pair("L1", SalesModel::Default, None)], &idx);
        assert!(out.commands.is_empty());
        assert_eq!(out.stats.noop_skipped, 1);
    }

    #[test]
    fn matching_listing_emits_nothing() {
        // catalog L2 qty=3 price=20.0, source S2 qty=3 price=20.0.
        let idx = index(&[entry("L2", SalesModel::Default, 3, 20_000_000)]);
        let out = compute_updates(
            &[pair(
                "L2",
                SalesModel::Default,
                Some(item("S2", 3, 20_000_000)),
            )],
            &idx,
        );
        assert!(out.commands.is_empty());
        assert_eq!(out.stats.noop_skipped, 1);
    }

    #[test]
    fn quantity_or_price_drift_emits_update() {
        let idx = index(&[
            entry("L1", SalesModel::Default, 3, 20_000_000),
            entry("L2", SalesModel::Default, 3, 20_000_000),
        ]);
        let out = compute_updates(
            &[
                pair("L1", SalesModel::Default, Some(item("S1", 4, 20_000_000))),
                pair("L2", SalesModel::Default, Some(item("S2", 3, 21_000_000))),
            ],
            &idx,
        );
        assert_eq!(out.commands.len(), 2);
        assert_eq!(out.stats.changed, 2);
    }

    #[test]
    fn negative_quantity_clamped_with_warning() {
        let idx = index(&[entry("L1", SalesModel::Default, 5, 10_000_000)]);
        let out = compute_updates(
            &[pair(
                "L1",
                SalesModel::Default,
                Some(item("S1", -5, 10_000_000)),
            )],
            &idx,
        );
        assert_eq!(out.commands.len(), 1);
        assert_eq!(out.commands[0].target_quantity, 0);
        assert!(matches!(
            out.issues[0],
            ReconcileIssue::QuantityClamped { got: -5, .. }
        ));
    }

    #[test]
    fn clamped_to_current_zero_is_still_noop() {
        let idx = index(&[entry("L1", SalesModel::Default, 0, 10_000_000)]);
        let out = compute_updates(
            &[pair(
                "L1",
                SalesModel::Default,
                Some(item("S1", -2, 10_000_000)),
            )],
            &idx,
        );
        assert!(out.commands.is_empty());
        assert_eq!(out.stats.noop_skipped, 1);
        assert_eq!(out.issues.len(), 1);
    }

    #[test]
    fn non_positive_price_excluded_with_issue() {
        let idx = index(&[entry("L1", SalesModel::Default, 5, 10_000_000)]);
        let out = compute_updates(
            &[pair("L1", SalesModel::Default, Some(item("S1", 5, 0)))],
            &idx,
        );
        assert!(out.commands.is_empty());
        assert!(matches!(
            out.issues[0],
            ReconcileIssue::InvalidPrice { price_micros: 0, .. }
        ));
        assert_eq!(out.stats.changed + out.stats.noop_skipped, 0);
    }

    #[test]
    fn present_with_zero_quantity_also_zeroes_and_may_fix_price() {
        // Source still lists the SKU but with zero stock and a newer price.
        let idx = index(&[entry("L1", SalesModel::Default, 4, 10_000_000)]);
        let out = compute_updates(
            &[pair(
                "L1",
                SalesModel::Default,
                Some(item("S1", 0, 11_000_000)),
            )],
            &idx,
        );
        assert_eq!(out.commands[0].target_quantity, 0);
        assert_eq!(out.commands[0].target_price_micros, 11_000_000);
    }

    #[test]
    fn output_sorted_by_listing_then_model() {
        let idx = index(&[
            entry("L2", SalesModel::Default, 5, 10_000_000),
            entry("L1", SalesModel::Dbs, 5, 10_000_000),
            entry("L1", SalesModel::Fbs, 5, 10_000_000),
        ]);
        let out = compute_updates(
            &[
                pair("L2", SalesModel::Default, None),
                pair("L1", SalesModel::Dbs, None),
                pair("L1", SalesModel::Fbs, None),
            ],
            &idx,
        );
        let keys: Vec<(&str, SalesModel)> = out
            .commands
            .iter()
            .map(|c| (c.listing_id.as_str(), c.sales_model))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("L1", SalesModel::Fbs),
                ("L1", SalesModel::Dbs),
                ("L2", SalesModel::Default),
            ]
        );
    }

    #[test]
    fn second_run_with_reconciled_catalog_is_empty() {
        // Run 1 output applied: catalog now matches source exactly.
        let idx = index(&[
            entry("L1", SalesModel::Default, 7, 10_000_000),
            entry("L2", SalesModel::Default, 0, 20_000_000),
        ]);
        let out = compute_updates(
            &[
                pair("L1", SalesModel::Default, Some(item("S1", 7, 10_000_000))),
                pair("L2", SalesModel::Default, None),
            ],
            &idx,
        );
        assert!(out.commands.is_empty());
        assert_eq!(out.stats.noop_skipped, 2);
    }
}
