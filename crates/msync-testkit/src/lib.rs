//! msync-testkit
//!
//! In-process fakes for scenario tests: a static feed, a scripted paged
//! catalog, and a recording update protocol with configurable failures.
//! No network, no files (scenario tests that need a CSV write their own
//! tempfile).

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use msync_catalog::{CatalogPage, CatalogProvider};
use msync_dispatch::{Batch, ItemOutcome, TransportError, UpdateApi};
use msync_feed::SourceProvider;
use msync_schemas::{CatalogEntry, FetchError, SalesModel, SourceItem, MICROS_SCALE};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Feed item priced in whole units, selling under any model.
pub fn feed_item(sku: &str, quantity: i64, price_units: i64) -> SourceItem {
    SourceItem {
        sku: sku.to_string(),
        quantity,
        price_micros: price_units * MICROS_SCALE,
        sales_model: None,
    }
}

/// Feed item bound to one fulfillment model.
pub fn feed_item_for(
    sku: &str,
    quantity: i64,
    price_units: i64,
    model: SalesModel,
) -> SourceItem {
    SourceItem {
        sales_model: Some(model),
        ..feed_item(sku, quantity, price_units)
    }
}

/// Catalog listing priced in whole units, resolvable through its own SKU.
pub fn listing(
    listing_id: &str,
    model: SalesModel,
    quantity: i64,
    price_units: i64,
) -> CatalogEntry {
    CatalogEntry {
        listing_id: listing_id.to_string(),
        sku: Some(listing_id.to_string()),
        sales_model: model,
        current_quantity: quantity,
        current_price_micros: price_units * MICROS_SCALE,
    }
}

/// Catalog listing with no SKU attached; resolution must go through the
/// explicit lookup table (or fail).
pub fn unlabeled_listing(
    listing_id: &str,
    model: SalesModel,
    quantity: i64,
    price_units: i64,
) -> CatalogEntry {
    CatalogEntry {
        sku: None,
        ..listing(listing_id, model, quantity, price_units)
    }
}

// ---------------------------------------------------------------------------
// Feed fake
// ---------------------------------------------------------------------------

/// Source provider serving a fixed item list.
pub struct StaticSource {
    items: Vec<SourceItem>,
}

impl StaticSource {
    pub fn new(items: Vec<SourceItem>) -> Self {
        Self { items }
    }
}

impl SourceProvider for StaticSource {
    fn name(&self) -> &'static str {
        "static-feed"
    }

    fn fetch(&self) -> Result<Vec<SourceItem>, FetchError> {
        Ok(self.items.clone())
    }
}

// ---------------------------------------------------------------------------
// Catalog fake
// ---------------------------------------------------------------------------

/// Catalog provider serving scripted pages, cursors `"page-1"`, `"page-2"`,
/// ... so pagination itself stays under test.
pub struct PagedCatalog {
    pages: Vec<Vec<CatalogEntry>>,
}

impl PagedCatalog {
    pub fn new(pages: Vec<Vec<CatalogEntry>>) -> Self {
        Self { pages }
    }

    pub fn single(entries: Vec<CatalogEntry>) -> Self {
        Self::new(vec![entries])
    }
}

impl CatalogProvider for PagedCatalog {
    fn name(&self) -> &'static str {
        "paged-catalog"
    }

    fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError> {
        let idx = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| FetchError::Decode(format!("unknown cursor '{c}'")))?,
        };
        let entries = self
            .pages
            .get(idx)
            .cloned()
            .ok_or_else(|| FetchError::Decode(format!("page {idx} out of range")))?;
        let next_cursor = if idx + 1 < self.pages.len() {
            Some(format!("page-{}", idx + 1))
        } else {
            None
        };
        Ok(CatalogPage {
            entries,
            next_cursor,
        })
    }
}

// ---------------------------------------------------------------------------
// Update protocol fake
// ---------------------------------------------------------------------------

/// Update protocol that records every submission.
///
/// Failure script:
/// - the first `transport_failures` submits fail with the configured
///   transport error, then submits succeed;
/// - listings named in `rejections` come back per-item rejected.
pub struct RecordingApi {
    submissions: Mutex<Vec<Vec<String>>>,
    transport_failures: AtomicU32,
    failure: TransportError,
    rejections: BTreeSet<String>,
}

impl RecordingApi {
    /// Applies everything.
    pub fn applying() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            transport_failures: AtomicU32::new(0),
            failure: TransportError::Timeout,
            rejections: BTreeSet::new(),
        }
    }

    /// Fails the first `n` submits with `failure`, then applies.
    pub fn failing_first(n: u32, failure: TransportError) -> Self {
        Self {
            transport_failures: AtomicU32::new(n),
            failure,
            ..Self::applying()
        }
    }

    /// Marks listings as per-item rejected on every submit.
    pub fn rejecting(self, listing_ids: &[&str]) -> Self {
        Self {
            rejections: listing_ids.iter().map(|s| s.to_string()).collect(),
            ..self
        }
    }

    /// Listing ids of each submitted batch, in submission order.
    pub fn submissions(&self) -> Vec<Vec<String>> {
        self.submissions.lock().expect("submission log poisoned").clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submissions.lock().expect("submission log poisoned").len()
    }
}

impl UpdateApi for RecordingApi {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn submit(&self, batch: &Batch) -> Result<Vec<ItemOutcome>, TransportError> {
        self.submissions
            .lock()
            .expect("submission log poisoned")
            .push(batch.iter().map(|c| c.listing_id.clone()).collect());

        let remaining = self.transport_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transport_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(self.failure.clone());
        }

        Ok(batch
            .iter()
            .map(|c| {
                if self.rejections.contains(&c.listing_id) {
                    ItemOutcome::Rejected {
                        detail: "marketplace validation failed".to_string(),
                    }
                } else {
                    ItemOutcome::Applied
                }
            })
            .collect())
    }
}
