//! Yandex batched updates: stocks PUT plus price-updates POST, routed to
//! the campaign matching each command's fulfillment model.
//!
//! Unlike Ozon, Yandex acknowledges a whole request without per-offer
//! results; an accepted call applies every command it carried.

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use msync_dispatch::{Batch, ItemOutcome, TransportError, UpdateApi};
use msync_reconcile::UpdateCommand;
use msync_schemas::{SalesModel, MICROS_SCALE};

use crate::{transport_from_reqwest, transport_from_status, CampaignScope, YandexClient};

const STOCK_ITEM_TYPE: &str = "FIT";
const CURRENCY: &str = "RUR";

pub struct YandexUpdateApi {
    client: YandexClient,
}

impl YandexUpdateApi {
    pub fn new(client: YandexClient) -> Self {
        Self { client }
    }

    fn send_scope<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<(), TransportError> {
        let resp = self
            .client
            .request_json(method, path, &[], Some(body))
            .map_err(transport_from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(transport_from_status(status));
        }
        Ok(())
    }

    /// Push stocks then prices for one campaign's share of the batch.
    fn submit_scope(
        &self,
        scope: &CampaignScope,
        commands: &[&UpdateCommand],
    ) -> Result<(), TransportError> {
        let now = Utc::now().to_rfc3339();
        let stocks_body = StocksUpdateRequest {
            skus: commands
                .iter()
                .map(|c| SkuStock {
                    sku: c.listing_id.clone(),
                    warehouse_id: scope.warehouse_id,
                    items: vec![StockItem {
                        count: c.target_quantity,
                        item_type: STOCK_ITEM_TYPE,
                        updated_at: now.clone(),
                    }],
                })
                .collect(),
        };
        let stocks_path = format!("/campaigns/{}/offers/stocks", scope.campaign_id);
        self.send_scope(reqwest::Method::PUT, &stocks_path, &stocks_body)?;

        let offers = price_updates(commands);
        if !offers.is_empty() {
            let prices_path = format!("/campaigns/{}/offer-prices/updates", scope.campaign_id);
            self.send_scope(
                reqwest::Method::POST,
                &prices_path,
                &PricesUpdateRequest { offers },
            )?;
        }

        debug!(
            campaign = %scope.campaign_id,
            model = scope.model.as_str(),
            commands = commands.len(),
            "yandex batch submitted"
        );
        Ok(())
    }
}

/// Price entries for the commands that actually carry a price.
///
/// A zero-out whose catalog join found no published price carries target
/// price 0; pushing that would overwrite the listed price, so such
/// commands update stock only.
fn price_updates(commands: &[&UpdateCommand]) -> Vec<OfferPriceUpdate> {
    commands
        .iter()
        .filter(|c| c.target_price_micros > 0)
        .map(|c| OfferPriceUpdate {
            offer_id: c.listing_id.clone(),
            price: PriceBody {
                value: c.target_price_micros / MICROS_SCALE,
                currency_id: CURRENCY,
            },
        })
        .collect()
}

impl UpdateApi for YandexUpdateApi {
    fn name(&self) -> &'static str {
        "yandex"
    }

    fn submit(&self, batch: &Batch) -> Result<Vec<ItemOutcome>, TransportError> {
        let mut outcomes: Vec<Option<ItemOutcome>> = vec![None; batch.len()];

        for scope in self.client.scopes() {
            let scoped: Vec<(usize, &UpdateCommand)> = batch
                .iter()
                .enumerate()
                .filter(|(_, c)| c.sales_model == scope.model)
                .collect();
            if scoped.is_empty() {
                continue;
            }
            let commands: Vec<&UpdateCommand> = scoped.iter().map(|(_, c)| *c).collect();
            self.submit_scope(scope, &commands)?;
            for (idx, _) in scoped {
                outcomes[idx] = Some(ItemOutcome::Applied);
            }
        }

        // Commands whose model has no campaign cannot be delivered at all.
        Ok(outcomes
            .into_iter()
            .enumerate()
            .map(|(idx, outcome)| {
                outcome.unwrap_or_else(|| ItemOutcome::Rejected {
                    detail: format!(
                        "no campaign configured for model {}",
                        batch[idx].sales_model.as_str()
                    ),
                })
            })
            .collect())
    }
}

// -----------------
// Wire shapes
// -----------------

#[derive(Debug, Serialize)]
struct StocksUpdateRequest {
    skus: Vec<SkuStock>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkuStock {
    sku: String,
    warehouse_id: i64,
    items: Vec<StockItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockItem {
    count: i64,
    #[serde(rename = "type")]
    item_type: &'static str,
    updated_at: String,
}

#[derive(Debug, Serialize)]
struct PricesUpdateRequest {
    offers: Vec<OfferPriceUpdate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OfferPriceUpdate {
    offer_id: String,
    price: PriceBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceBody {
    value: i64,
    currency_id: &'static str,
}

// -----------------
// Tests (no network)
// -----------------

#[cfg(test)]
mod tests {
    use super::*;

    fn command(listing_id: &str, model: SalesModel) -> UpdateCommand {
        UpdateCommand {
            listing_id: listing_id.to_string(),
            sales_model: model,
            target_quantity: 3,
            target_price_micros: 120 * MICROS_SCALE,
        }
    }

    #[test]
    fn stocks_body_carries_warehouse_and_absolute_count() {
        let c = command("SKU-1", SalesModel::Fbs);
        let body = StocksUpdateRequest {
            skus: vec![SkuStock {
                sku: c.listing_id.clone(),
                warehouse_id: 900,
                items: vec![StockItem {
                    count: c.target_quantity,
                    item_type: STOCK_ITEM_TYPE,
                    updated_at: "2026-01-01T00:00:00+00:00".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["skus"][0]["sku"], "SKU-1");
        assert_eq!(json["skus"][0]["warehouseId"], 900);
        assert_eq!(json["skus"][0]["items"][0]["count"], 3);
        assert_eq!(json["skus"][0]["items"][0]["type"], "FIT");
    }

    #[test]
    fn price_body_is_whole_units_in_rur() {
        let c = command("SKU-1", SalesModel::Dbs);
        let body = PricesUpdateRequest {
            offers: price_updates(&[&c]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["offers"][0]["offerId"], "SKU-1");
        assert_eq!(json["offers"][0]["price"]["value"], 120);
        assert_eq!(json["offers"][0]["price"]["currencyId"], "RUR");
    }

    #[test]
    fn zero_price_command_gets_no_price_update() {
        let mut zeroed = command("SKU-1", SalesModel::Fbs);
        zeroed.target_quantity = 0;
        zeroed.target_price_micros = 0;
        let priced = command("SKU-2", SalesModel::Fbs);
        let offers = price_updates(&[&zeroed, &priced]);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].offer_id, "SKU-2");
    }
}
