//! Ozon batched imports: one stocks call plus one prices call per batch.
//!
//! Ozon answers both imports with per-offer results, so a batch can come
//! back mixed: some offers applied, some rejected with error details. The
//! merge below keeps one outcome per command, in command order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use msync_dispatch::{Batch, ItemOutcome, TransportError, UpdateApi};
use msync_schemas::MICROS_SCALE;

use crate::{transport_from_reqwest, transport_from_status, OzonClient};

const STOCKS_IMPORT_PATH: &str = "/v1/product/import/stocks";
const PRICES_IMPORT_PATH: &str = "/v1/product/import/prices";

pub struct OzonUpdateApi {
    client: OzonClient,
}

impl OzonUpdateApi {
    pub fn new(client: OzonClient) -> Self {
        Self { client }
    }

    fn post_import<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<ImportItemResult>, TransportError> {
        let resp = self
            .client
            .post_json(path, body)
            .map_err(transport_from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(transport_from_status(status));
        }
        let decoded: ImportResponse = resp
            .json()
            .map_err(|e| TransportError::Connect(format!("import response decode failed: {e}")))?;
        Ok(decoded.result)
    }
}

impl UpdateApi for OzonUpdateApi {
    fn name(&self) -> &'static str {
        "ozon"
    }

    fn submit(&self, batch: &Batch) -> Result<Vec<ItemOutcome>, TransportError> {
        let stocks_body = StocksImportRequest {
            stocks: batch
                .iter()
                .map(|c| StockImport {
                    offer_id: c.listing_id.clone(),
                    stock: c.target_quantity,
                })
                .collect(),
        };
        let prices = price_imports(batch);

        let stock_results = self.post_import(STOCKS_IMPORT_PATH, &stocks_body)?;
        let price_results = if prices.is_empty() {
            Vec::new()
        } else {
            self.post_import(PRICES_IMPORT_PATH, &PricesImportRequest { prices })?
        };
        debug!(commands = batch.len(), "ozon batch imported");

        Ok(merge_import_results(batch, &stock_results, &price_results))
    }
}

/// Ozon takes prices as whole-unit decimal strings.
fn price_units_string(price_micros: i64) -> String {
    (price_micros / MICROS_SCALE).to_string()
}

/// Price entries for the commands that actually carry a price.
///
/// A zero-out for a listing whose catalog join found no published price
/// carries target price 0; Ozon rejects zero prices, so such commands
/// import stock only and leave the price untouched.
fn price_imports(batch: &Batch) -> Vec<PriceImport> {
    batch
        .iter()
        .filter(|c| c.target_price_micros > 0)
        .map(|c| PriceImport {
            offer_id: c.listing_id.clone(),
            price: price_units_string(c.target_price_micros),
            old_price: "0".to_string(),
            currency_code: "RUB",
            auto_action_enabled: "UNKNOWN",
        })
        .collect()
}

/// One outcome per command: applied only when both imports accepted the
/// offer; otherwise the rejection detail names the failing side(s).
fn merge_import_results(
    batch: &Batch,
    stock_results: &[ImportItemResult],
    price_results: &[ImportItemResult],
) -> Vec<ItemOutcome> {
    let stocks: BTreeMap<&str, &ImportItemResult> = stock_results
        .iter()
        .map(|r| (r.offer_id.as_str(), r))
        .collect();
    let prices: BTreeMap<&str, &ImportItemResult> = price_results
        .iter()
        .map(|r| (r.offer_id.as_str(), r))
        .collect();

    batch
        .iter()
        .map(|command| {
            let mut details = Vec::new();
            match stocks.get(command.listing_id.as_str()) {
                Some(r) if r.updated => {}
                Some(r) => details.push(format!("stock: {}", r.error_detail())),
                None => details.push("stock: no result returned".to_string()),
            }
            // Commands without a price never entered the price import.
            if command.target_price_micros > 0 {
                match prices.get(command.listing_id.as_str()) {
                    Some(r) if r.updated => {}
                    Some(r) => details.push(format!("price: {}", r.error_detail())),
                    None => details.push("price: no result returned".to_string()),
                }
            }
            if details.is_empty() {
                ItemOutcome::Applied
            } else {
                ItemOutcome::Rejected {
                    detail: details.join("; "),
                }
            }
        })
        .collect()
}

// -----------------
// Wire shapes
// -----------------

#[derive(Debug, Serialize)]
struct StocksImportRequest {
    stocks: Vec<StockImport>,
}

#[derive(Debug, Serialize)]
struct StockImport {
    offer_id: String,
    stock: i64,
}

#[derive(Debug, Serialize)]
struct PricesImportRequest {
    prices: Vec<PriceImport>,
}

#[derive(Debug, Serialize)]
struct PriceImport {
    offer_id: String,
    price: String,
    old_price: String,
    currency_code: &'static str,
    auto_action_enabled: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    #[serde(default)]
    result: Vec<ImportItemResult>,
}

#[derive(Debug, Deserialize)]
struct ImportItemResult {
    offer_id: String,
    #[serde(default)]
    updated: bool,
    #[serde(default)]
    errors: Vec<ImportError>,
}

impl ImportItemResult {
    fn error_detail(&self) -> String {
        if self.errors.is_empty() {
            return "not updated".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{} {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct ImportError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

// -----------------
// Tests (no network)
// -----------------
