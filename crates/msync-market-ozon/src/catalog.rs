//! Ozon catalog snapshot: paged stock listing joined with current prices.
//!
//! Ozon identifies listings by `offer_id`, which is also the seller's own
//! SKU, so every entry resolves to itself. All Ozon listings sell under
//! the default model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use msync_catalog::{CatalogPage, CatalogProvider};
use msync_feed::price_to_micros;
use msync_schemas::{CatalogEntry, FetchError, SalesModel};

use crate::{fetch_from_reqwest, fetch_from_status, OzonClient};

const STOCKS_PATH: &str = "/v3/product/info/stocks";
const PRICES_PATH: &str = "/v4/product/info/prices";
const PAGE_LIMIT: u32 = 1000;

pub struct OzonCatalogProvider {
    client: OzonClient,
}

impl OzonCatalogProvider {
    pub fn new(client: OzonClient) -> Self {
        Self { client }
    }

    fn fetch_stock_page(&self, cursor: Option<&str>) -> Result<StockResult, FetchError> {
        let body = StockListRequest {
            filter: VisibilityFilter {
                visibility: "ALL",
                offer_id: Vec::new(),
            },
            last_id: cursor.unwrap_or("").to_string(),
            limit: PAGE_LIMIT,
        };
        let resp = self
            .client
            .post_json(STOCKS_PATH, &body)
            .map_err(fetch_from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(fetch_from_status(status, text));
        }
        let decoded: StockListResponse = resp
            .json()
            .map_err(|e| FetchError::Decode(format!("stock page decode failed: {e}")))?;
        Ok(decoded.result)
    }

    /// Current prices for the given offers, keyed by offer_id.
    fn fetch_prices_for(
        &self,
        offer_ids: Vec<String>,
    ) -> Result<std::collections::BTreeMap<String, i64>, FetchError> {
        let limit = offer_ids.len() as u32;
        let body = PriceListRequest {
            filter: VisibilityFilter {
                visibility: "ALL",
                offer_id: offer_ids,
            },
            limit,
        };
        let resp = self
            .client
            .post_json(PRICES_PATH, &body)
            .map_err(fetch_from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(fetch_from_status(status, text));
        }
        let decoded: PriceListResponse = resp
            .json()
            .map_err(|e| FetchError::Decode(format!("price page decode failed: {e}")))?;

        let mut out = std::collections::BTreeMap::new();
        for item in decoded.result.items {
            let micros = price_to_micros(&item.price.price)
                .map_err(|e| FetchError::Decode(format!("offer '{}': {e}", item.offer_id)))?;
            out.insert(item.offer_id, micros);
        }
        Ok(out)
    }
}

impl CatalogProvider for OzonCatalogProvider {
    fn name(&self) -> &'static str {
        "ozon"
    }

    fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError> {
        let page = self.fetch_stock_page(cursor)?;
        if page.items.is_empty() {
            return Ok(CatalogPage {
                entries: Vec::new(),
                next_cursor: None,
            });
        }

        let offer_ids: Vec<String> = page.items.iter().map(|i| i.offer_id.clone()).collect();
        let prices = self.fetch_prices_for(offer_ids)?;
        debug!(items = page.items.len(), "ozon catalog page fetched");

        let entries = page
            .items
            .into_iter()
            .map(|item| {
                let current_quantity: i64 = item.stocks.iter().map(|s| s.present).sum();
                // A listing with no published price diffs as a change and
                // gets its price pushed on the next run.
                let current_price_micros = prices.get(&item.offer_id).copied().unwrap_or(0);
                CatalogEntry {
                    listing_id: item.offer_id.clone(),
                    sku: Some(item.offer_id),
                    sales_model: SalesModel::Default,
                    current_quantity,
                    current_price_micros,
                }
            })
            .collect();

        let next_cursor = match page.last_id {
            Some(id) if !id.is_empty() => Some(id),
            _ => None,
        };
        Ok(CatalogPage {
            entries,
            next_cursor,
        })
    }
}

// -----------------
// Wire shapes
// -----------------

#[derive(Debug, Serialize)]
struct VisibilityFilter {
    visibility: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    offer_id: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StockListRequest {
    filter: VisibilityFilter,
    last_id: String,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct StockListResponse {
    result: StockResult,
}

#[derive(Debug, Deserialize)]
struct StockResult {
    #[serde(default)]
    items: Vec<StockItem>,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StockItem {
    offer_id: String,
    #[serde(default)]
    stocks: Vec<StockLevel>,
}

#[derive(Debug, Deserialize)]
struct StockLevel {
    #[serde(default)]
    present: i64,
}

#[derive(Debug, Serialize)]
struct PriceListRequest {
    filter: VisibilityFilter,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct PriceListResponse {
    result: PriceResult,
}

#[derive(Debug, Deserialize)]
struct PriceResult {
    #[serde(default)]
    items: Vec<PriceItem>,
}

#[derive(Debug, Deserialize)]
struct PriceItem {
    offer_id: String,
    price: PriceDetail,
}

#[derive(Debug, Deserialize)]
struct PriceDetail {
    #[serde(default)]
    price: String,
}

// -----------------
// Tests (no network)
// -----------------
