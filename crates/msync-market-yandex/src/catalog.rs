//! Yandex catalog snapshot: warehouse stocks joined with current prices,
//! paged across both campaigns behind one composite cursor.
//!
//! The cursor is `"<MODEL>|<page_token>"`; an empty token means the first
//! page of that campaign. The FBS campaign pages out first, then DBS.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use serde::Deserialize;
use tracing::debug;

use msync_catalog::{CatalogPage, CatalogProvider};
use msync_feed::price_to_micros;
use msync_schemas::{CatalogEntry, FetchError, SalesModel};

use crate::{fetch_from_reqwest, fetch_from_status, CampaignScope, YandexClient};

const PAGE_LIMIT: u32 = 200;
const AVAILABLE_STOCK_TYPE: &str = "AVAILABLE";

pub struct YandexCatalogProvider {
    client: YandexClient,
    /// Current prices per campaign, fetched once on first use.
    price_cache: Mutex<BTreeMap<String, BTreeMap<String, i64>>>,
}

impl YandexCatalogProvider {
    pub fn new(client: YandexClient) -> Self {
        Self {
            client,
            price_cache: Mutex::new(BTreeMap::new()),
        }
    }

    fn fetch_stock_page(
        &self,
        scope: &CampaignScope,
        page_token: Option<&str>,
    ) -> Result<StocksResult, FetchError> {
        let path = format!("/campaigns/{}/offers/stocks", scope.campaign_id);
        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }
        let body = serde_json::json!({});
        let resp = self
            .client
            .request_json(reqwest::Method::POST, &path, &query, Some(&body))
            .map_err(fetch_from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(fetch_from_status(status, text));
        }
        let decoded: StocksResponse = resp
            .json()
            .map_err(|e| FetchError::Decode(format!("stocks page decode failed: {e}")))?;
        Ok(decoded.result)
    }

    /// Full price map for one campaign, cached for the life of the run.
    fn prices_for_campaign(
        &self,
        scope: &CampaignScope,
    ) -> Result<BTreeMap<String, i64>, FetchError> {
        {
            let cache = self.price_cache.lock().expect("price cache poisoned");
            if let Some(map) = cache.get(&scope.campaign_id) {
                return Ok(map.clone());
            }
        }

        let path = format!("/campaigns/{}/offer-prices", scope.campaign_id);
        let mut map = BTreeMap::new();
        let mut token: Option<String> = None;
        let mut seen_tokens: BTreeSet<String> = BTreeSet::new();

        loop {
            let mut query = vec![("limit", PAGE_LIMIT.to_string())];
            if let Some(t) = &token {
                query.push(("page_token", t.clone()));
            }
            let resp = self
                .client
                .request_json::<()>(reqwest::Method::GET, &path, &query, None)
                .map_err(fetch_from_reqwest)?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().unwrap_or_default();
                return Err(fetch_from_status(status, text));
            }
            let decoded: PricesResponse = resp
                .json()
                .map_err(|e| FetchError::Decode(format!("price page decode failed: {e}")))?;

            for offer in decoded.result.offer_prices {
                if let Some(price) = offer.price {
                    let micros = price_to_micros(&price.value.to_string())
                        .map_err(|e| FetchError::Decode(format!("offer '{}': {e}", offer.id)))?;
                    map.insert(offer.id, micros);
                }
            }

            match decoded.result.paging.and_then(|p| p.next_page_token) {
                Some(next) if !next.is_empty() => {
                    if !seen_tokens.insert(next.clone()) {
                        return Err(FetchError::Decode(format!(
                            "campaign '{}' repeated price page token",
                            scope.campaign_id
                        )));
                    }
                    token = Some(next);
                }
                _ => break,
            }
        }

        let mut cache = self.price_cache.lock().expect("price cache poisoned");
        cache.insert(scope.campaign_id.clone(), map.clone());
        Ok(map)
    }
}

impl CatalogProvider for YandexCatalogProvider {
    fn name(&self) -> &'static str {
        "yandex"
    }

    fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError> {
        let scopes = self.client.scopes();
        let (scope_idx, page_token) = parse_cursor(cursor, scopes)?;
        let scope = &scopes[scope_idx];

        let page = self.fetch_stock_page(scope, page_token.as_deref())?;
        let prices = self.prices_for_campaign(scope)?;

        let mut entries = Vec::new();
        for warehouse in page.warehouses {
            if warehouse.warehouse_id != scope.warehouse_id {
                continue;
            }
            for offer in warehouse.offers {
                let current_quantity: i64 = offer
                    .stocks
                    .iter()
                    .filter(|s| s.stock_type == AVAILABLE_STOCK_TYPE)
                    .map(|s| s.count)
                    .sum();
                // Missing published price diffs as a change and gets the
                // price pushed on the next run.
                let current_price_micros = prices.get(&offer.offer_id).copied().unwrap_or(0);
                entries.push(CatalogEntry {
                    listing_id: offer.offer_id.clone(),
                    sku: Some(offer.offer_id),
                    sales_model: scope.model,
                    current_quantity,
                    current_price_micros,
                });
            }
        }
        debug!(
            campaign = %scope.campaign_id,
            model = scope.model.as_str(),
            entries = entries.len(),
            "yandex catalog page fetched"
        );

        let next_token = page.paging.and_then(|p| p.next_page_token);
        let next_cursor = match next_token {
            Some(token) if !token.is_empty() => Some(encode_cursor(scope.model, &token)),
            // Campaign exhausted: move to the next scope's first page.
            _ => scopes
                .get(scope_idx + 1)
                .map(|next| encode_cursor(next.model, "")),
        };
        Ok(CatalogPage {
            entries,
            next_cursor,
        })
    }
}

fn encode_cursor(model: SalesModel, token: &str) -> String {
    format!("{}|{token}", model.as_str())
}

/// Decode a composite cursor into (scope index, page token).
fn parse_cursor(
    cursor: Option<&str>,
    scopes: &[CampaignScope],
) -> Result<(usize, Option<String>), FetchError> {
    let Some(raw) = cursor else {
        return Ok((0, None));
    };
    let (model_str, token) = raw
        .split_once('|')
        .ok_or_else(|| FetchError::Decode(format!("malformed catalog cursor '{raw}'")))?;
    let idx = scopes
        .iter()
        .position(|s| s.model.as_str() == model_str)
        .ok_or_else(|| FetchError::Decode(format!("catalog cursor names unknown model '{model_str}'")))?;
    let token = if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    };
    Ok((idx, token))
}

// -----------------
// Wire shapes
// -----------------

#[derive(Debug, Deserialize)]
struct StocksResponse {
    result: StocksResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StocksResult {
    #[serde(default)]
    warehouses: Vec<WarehouseStocks>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarehouseStocks {
    warehouse_id: i64,
    #[serde(default)]
    offers: Vec<WarehouseOffer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarehouseOffer {
    offer_id: String,
    #[serde(default)]
    stocks: Vec<StockCount>,
}

#[derive(Debug, Deserialize)]
struct StockCount {
    #[serde(rename = "type")]
    stock_type: String,
    #[serde(default)]
    count: i64,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    result: PricesResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricesResult {
    #[serde(default)]
    offer_prices: Vec<OfferPrice>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct OfferPrice {
    id: String,
    #[serde(default)]
    price: Option<PriceValue>,
}

#[derive(Debug, Deserialize)]
struct PriceValue {
    value: serde_json::Number,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paging {
    #[serde(default)]
    next_page_token: Option<String>,
}

// -----------------
// Tests (no network)
// -----------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes() -> Vec<CampaignScope> {
        vec![
            CampaignScope {
                model: SalesModel::Fbs,
                campaign_id: "111".to_string(),
                warehouse_id: 900,
            },
            CampaignScope {
                model: SalesModel::Dbs,
                campaign_id: "222".to_string(),
                warehouse_id: 901,
            },
        ]
    }

    #[test]
    fn cursor_round_trip_across_scopes() {
        let scopes = scopes();
        assert_eq!(parse_cursor(None, &scopes).unwrap(), (0, None));
        assert_eq!(
            parse_cursor(Some("FBS|abc"), &scopes).unwrap(),
            (0, Some("abc".to_string()))
        );
        // Empty token: first page of the DBS campaign.
        assert_eq!(parse_cursor(Some("DBS|"), &scopes).unwrap(), (1, None));
    }

    #[test]
    fn malformed_cursor_rejected() {
        let scopes = scopes();
        assert!(parse_cursor(Some("no-separator"), &scopes).is_err());
        assert!(parse_cursor(Some("FBO|x"), &scopes).is_err());
    }

    #[test]
    fn stocks_response_decodes() {
        let raw = r#"{
            "status": "OK",
            "result": {
                "warehouses": [
                    {"warehouseId": 900, "offers": [
                        {"offerId": "SKU-1", "stocks": [
                            {"type": "AVAILABLE", "count": 4},
                            {"type": "FREEZE", "count": 1}
                        ]}
                    ]}
                ],
                "paging": {"nextPageToken": "t2"}
            }
        }"#;
        let decoded: StocksResponse = serde_json::from_str(raw).unwrap();
        let offers = &decoded.result.warehouses[0].offers;
        let available: i64 = offers[0]
            .stocks
            .iter()
            .filter(|s| s.stock_type == AVAILABLE_STOCK_TYPE)
            .map(|s| s.count)
            .sum();
        assert_eq!(available, 4);
        assert_eq!(
            decoded.result.paging.unwrap().next_page_token.as_deref(),
            Some("t2")
        );
    }

    #[test]
    fn prices_response_decodes_integer_and_decimal() {
        let raw = r#"{
            "status": "OK",
            "result": {
                "offerPrices": [
                    {"id": "SKU-1", "price": {"value": 5990, "currencyId": "RUR"}},
                    {"id": "SKU-2", "price": {"value": 120.5, "currencyId": "RUR"}},
                    {"id": "SKU-3"}
                ],
                "paging": {}
            }
        }"#;
        let decoded: PricesResponse = serde_json::from_str(raw).unwrap();
        let prices = &decoded.result.offer_prices;
        assert_eq!(
            price_to_micros(&prices[0].price.as_ref().unwrap().value.to_string()).unwrap(),
            5_990_000_000
        );
        // Fractions are dropped, matching feed normalization.
        assert_eq!(
            price_to_micros(&prices[1].price.as_ref().unwrap().value.to_string()).unwrap(),
            120_000_000
        );
        assert!(prices[2].price.is_none());
    }
}
