//! msync-market-yandex
//!
//! Live Yandex.Market partner-API adapter. One seller account runs two
//! campaigns, one per fulfillment model (FBS and DBS), each with its own
//! warehouse; this crate fans catalog reads and update writes out across
//! both and tags every entry with its model.

pub mod catalog;
pub mod update;

use serde::Serialize;

use msync_config::YandexCredentials;
use msync_dispatch::TransportError;
use msync_schemas::{FetchError, SalesModel};

pub use catalog::YandexCatalogProvider;
pub use update::YandexUpdateApi;

const DEFAULT_BASE_URL: &str = "https://api.partner.market.yandex.ru";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// One campaign + warehouse pair, bound to its fulfillment model.
#[derive(Clone, Debug)]
pub struct CampaignScope {
    pub model: SalesModel,
    pub campaign_id: String,
    pub warehouse_id: i64,
}

/// Shared Yandex HTTP client: bearer token, base URL, campaign scopes.
///
/// The token is never logged; see [`YandexCredentials`]'s redacted Debug.
#[derive(Debug, Clone)]
pub struct YandexClient {
    token: String,
    http: reqwest::blocking::Client,
    base_url: String,
    scopes: Vec<CampaignScope>,
}

impl YandexClient {
    pub fn new(creds: YandexCredentials) -> Result<Self, FetchError> {
        Self::new_with_base_url(creds, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(
        creds: YandexCredentials,
        base_url: String,
    ) -> Result<Self, FetchError> {
        let scopes = vec![
            CampaignScope {
                model: SalesModel::Fbs,
                campaign_id: creds.fbs_campaign_id.clone(),
                warehouse_id: parse_warehouse_id(&creds.fbs_warehouse_id, "FBS")?,
            },
            CampaignScope {
                model: SalesModel::Dbs,
                campaign_id: creds.dbs_campaign_id.clone(),
                warehouse_id: parse_warehouse_id(&creds.dbs_warehouse_id, "DBS")?,
            },
        ];
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            token: creds.token,
            http,
            base_url,
            scopes,
        })
    }

    pub fn scopes(&self) -> &[CampaignScope] {
        &self.scopes
    }

    pub fn scope_for(&self, model: SalesModel) -> Option<&CampaignScope> {
        self.scopes.iter().find(|s| s.model == model)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Send a JSON request with bearer auth. `query` carries pagination.
    fn request_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<reqwest::blocking::Response, reqwest::Error> {
        let url = self.url(path);
        enter_blocking(|| {
            let mut req = self
                .http
                .request(method, url)
                .bearer_auth(&self.token)
                .query(query);
            if let Some(b) = body {
                req = req.json(b);
            }
            req.send()
        })
    }
}

/// Campaign and warehouse ids come from the environment as strings; the
/// stocks payload needs the warehouse as a number.
fn parse_warehouse_id(raw: &str, which: &str) -> Result<i64, FetchError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FetchError::Config(format!("{which} warehouse id is not an integer")))
}

/// reqwest::blocking drops an internal runtime on completion; doing that
/// on an async worker thread panics under Tokio. Hop through
/// block_in_place when we are on a multi-threaded runtime.
fn enter_blocking<T>(f: impl FnOnce() -> T) -> T {
    use tokio::runtime::{Handle, RuntimeFlavor};
    match Handle::try_current() {
        Ok(h) if h.runtime_flavor() == RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => f(),
    }
}

// -----------------
// Error mapping
// -----------------

fn transport_from_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connect(e.to_string())
    }
}

fn transport_from_status(status: reqwest::StatusCode) -> TransportError {
    if status.as_u16() == 429 {
        TransportError::RateLimited
    } else {
        TransportError::Status(status.as_u16())
    }
}

fn fetch_from_reqwest(e: reqwest::Error) -> FetchError {
    FetchError::Transport(e.to_string())
}

fn fetch_from_status(status: reqwest::StatusCode, body: String) -> FetchError {
    FetchError::Api {
        code: Some(i64::from(status.as_u16())),
        message: body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> YandexCredentials {
        YandexCredentials {
            token: "tok".to_string(),
            fbs_campaign_id: "111".to_string(),
            dbs_campaign_id: "222".to_string(),
            fbs_warehouse_id: "900".to_string(),
            dbs_warehouse_id: "901".to_string(),
        }
    }

    #[test]
    fn scopes_cover_both_models_in_order() {
        let client = YandexClient::new(creds()).unwrap();
        let models: Vec<SalesModel> = client.scopes().iter().map(|s| s.model).collect();
        assert_eq!(models, vec![SalesModel::Fbs, SalesModel::Dbs]);
        assert_eq!(client.scope_for(SalesModel::Dbs).unwrap().warehouse_id, 901);
        assert!(client.scope_for(SalesModel::Default).is_none());
    }

    #[test]
    fn non_numeric_warehouse_id_is_a_config_error() {
        let mut c = creds();
        c.fbs_warehouse_id = "main".to_string();
        let err = YandexClient::new(c).unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
