//! Marketplace credential resolution.
//!
//! # Contract
//! - Credentials come from named environment variables, resolved **once**
//!   at startup; never scatter `std::env::var` calls across the codebase.
//! - The resolved structs are passed into adapter constructors.
//! - `Debug` impls redact values.
//! - Error messages reference the env var **NAME**, never the value.

use anyhow::{bail, Result};

pub const OZON_CLIENT_ID_VAR: &str = "MSYNC_OZON_CLIENT_ID";
pub const OZON_API_KEY_VAR: &str = "MSYNC_OZON_API_KEY";
pub const YANDEX_TOKEN_VAR: &str = "MSYNC_MARKET_TOKEN";
pub const YANDEX_FBS_CAMPAIGN_VAR: &str = "MSYNC_FBS_CAMPAIGN_ID";
pub const YANDEX_DBS_CAMPAIGN_VAR: &str = "MSYNC_DBS_CAMPAIGN_ID";
pub const YANDEX_FBS_WAREHOUSE_VAR: &str = "MSYNC_FBS_WAREHOUSE_ID";
pub const YANDEX_DBS_WAREHOUSE_VAR: &str = "MSYNC_DBS_WAREHOUSE_ID";

/// Ozon seller-API credentials. **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct OzonCredentials {
    pub client_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for OzonCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OzonCredentials")
            .field("client_id", &"<REDACTED>")
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

/// Yandex-Market campaign-API credentials, one campaign + warehouse per
/// fulfillment model. **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct YandexCredentials {
    pub token: String,
    pub fbs_campaign_id: String,
    pub dbs_campaign_id: String,
    pub fbs_warehouse_id: String,
    pub dbs_warehouse_id: String,
}

impl std::fmt::Debug for YandexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexCredentials")
            .field("token", &"<REDACTED>")
            .field("fbs_campaign_id", &"<REDACTED>")
            .field("dbs_campaign_id", &"<REDACTED>")
            .field("fbs_warehouse_id", &"<REDACTED>")
            .field("dbs_warehouse_id", &"<REDACTED>")
            .finish()
    }
}

/// Resolve a named environment variable.
/// Returns `None` if the variable is unset or its value is blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn required(var_name: &str, what: &str) -> Result<String> {
    match resolve_env(var_name) {
        Some(v) => Ok(v),
        None => bail!(
            "CREDENTIALS_MISSING: required env var '{var_name}' ({what}) is not set or empty"
        ),
    }
}

pub fn resolve_ozon_credentials() -> Result<OzonCredentials> {
    Ok(OzonCredentials {
        client_id: required(OZON_CLIENT_ID_VAR, "ozon client id")?,
        api_key: required(OZON_API_KEY_VAR, "ozon api key")?,
    })
}

pub fn resolve_yandex_credentials() -> Result<YandexCredentials> {
    Ok(YandexCredentials {
        token: required(YANDEX_TOKEN_VAR, "yandex market token")?,
        fbs_campaign_id: required(YANDEX_FBS_CAMPAIGN_VAR, "FBS campaign id")?,
        dbs_campaign_id: required(YANDEX_DBS_CAMPAIGN_VAR, "DBS campaign id")?,
        fbs_warehouse_id: required(YANDEX_FBS_WAREHOUSE_VAR, "FBS warehouse id")?,
        dbs_warehouse_id: required(YANDEX_DBS_WAREHOUSE_VAR, "DBS warehouse id")?,
    })
}
