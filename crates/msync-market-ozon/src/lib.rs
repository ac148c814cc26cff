//! msync-market-ozon
//!
//! Live Ozon Seller API adapter: catalog snapshot pages and batched
//! stock/price imports. This crate owns the wire shapes and HTTP error
//! mapping; it does **not** decide what to update — callers hand it
//! fully formed commands.

pub mod catalog;
pub mod update;

use serde::Serialize;

use msync_config::OzonCredentials;
use msync_dispatch::TransportError;
use msync_schemas::FetchError;

pub use catalog::OzonCatalogProvider;
pub use update::OzonUpdateApi;

const DEFAULT_BASE_URL: &str = "https://api-seller.ozon.ru";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Shared Ozon HTTP client: credentials, base URL, one blocking client.
///
/// Credentials are never logged; see [`OzonCredentials`]'s redacted Debug.
#[derive(Debug, Clone)]
pub struct OzonClient {
    creds: OzonCredentials,
    http: reqwest::blocking::Client,
    base_url: String,
}

impl OzonClient {
    pub fn new(creds: OzonCredentials) -> Result<Self, FetchError> {
        Self::new_with_base_url(creds, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(creds: OzonCredentials, base_url: String) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            creds,
            http,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body with Ozon auth headers and return the raw response.
    fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response, reqwest::Error> {
        let url = self.url(path);
        enter_blocking(|| {
            self.http
                .post(url)
                .header("Client-Id", &self.creds.client_id)
                .header("Api-Key", &self.creds.api_key)
                .json(body)
                .send()
        })
    }
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
