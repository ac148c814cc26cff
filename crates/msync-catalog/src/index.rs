//! Lookup indexes over one run's snapshots.
//!
//! BTreeMaps keep iteration deterministic, which in turn keeps the engine's
//! output and the batch boundaries reproducible across identical runs.

use std::collections::BTreeMap;

use msync_schemas::{CatalogEntry, SalesModel, SourceItem};

/// Key the engine uses to look up a catalog entry for a resolved pair.
pub type CatalogKey = (String, SalesModel);

/// Index catalog entries by (listing_id, sales_model).
///
/// A marketplace returning two entries for the same key is collapsed to the
/// last one; the snapshot is taken as the marketplace's final word.
pub fn index_catalog(entries: &[CatalogEntry]) -> BTreeMap<CatalogKey, CatalogEntry> {
    let mut index = BTreeMap::new();
    for e in entries {
        index.insert((e.listing_id.clone(), e.sales_model), e.clone());
    }
    index
}

/// Index source items by (sku, sales_model).
///
/// `sales_model: None` rows index under `None` and act as a wildcard during
/// resolution; model-specific rows index under their model.
pub fn index_source(
    items: &[SourceItem],
) -> BTreeMap<(String, Option<SalesModel>), SourceItem> {
    let mut index = BTreeMap::new();
    for item in items {
        index.insert((item.sku.clone(), item.sales_model), item.clone());
    }
    index
}
