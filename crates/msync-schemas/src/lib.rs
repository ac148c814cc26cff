//! msync-schemas
//!
//! Shared domain types for one reconciliation run.
//!
//! Everything here is an immutable in-memory snapshot: source items and
//! catalog entries are fetched fresh each run and discarded after the
//! report is produced. No persistence, no I/O, no marketplace specifics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Micros scale (1e-6) used for all prices.
///
/// Feed prices are converted to integer micros at the boundary so no
/// floating-point rounding can leak into change detection.
pub const MICROS_SCALE: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Sales model
// ---------------------------------------------------------------------------

/// Fulfillment model a listing is published under.
///
/// Marketplaces that split stock per fulfillment channel (Yandex Market)
/// publish separate FBS and DBS records for the same SKU; marketplaces that
/// do not (Ozon) use [`SalesModel::Default`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SalesModel {
    Default,
    Fbs,
    Dbs,
}

impl SalesModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesModel::Default => "DEFAULT",
            SalesModel::Fbs => "FBS",
            SalesModel::Dbs => "DBS",
        }
    }
}

impl fmt::Display for SalesModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Source & catalog snapshots
// ---------------------------------------------------------------------------

/// One row of source truth: what the supplier actually has.
///
/// `sales_model: None` means the source does not distinguish fulfillment
/// channels; the resolver fans such a row out to every channel the catalog
/// publishes for that SKU.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Supplier SKU, unique within one feed.
    pub sku: String,
    /// Available quantity as reported. May be negative in a corrupt feed;
    /// the engine clamps and records a warning.
    pub quantity: i64,
    /// Price in micros. Non-positive prices are rejected by the engine.
    pub price_micros: i64,
    pub sales_model: Option<SalesModel>,
}

/// One marketplace listing as observed at fetch time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Marketplace-assigned listing identifier.
    pub listing_id: String,
    /// Supplier SKU, when the marketplace returns it. `None` forces a
    /// resolver lookup (and an UNRESOLVABLE record if that fails too).
    pub sku: Option<String>,
    pub sales_model: SalesModel,
    pub current_quantity: i64,
    pub current_price_micros: i64,
}

// ---------------------------------------------------------------------------
// Fetch error (fatal)
// ---------------------------------------------------------------------------

/// Failure to obtain source truth or a catalog snapshot.
///
/// Always fatal for the run: reconciling against incomplete or corrupt
/// input would push wrong quantities.
#[derive(Debug)]
pub enum FetchError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API returned an application-level error.
    Api { code: Option<i64>, message: String },
    /// A payload or feed row could not be decoded.
    Decode(String),
    /// A required configuration value is missing or invalid.
    Config(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Api {
                code: Some(c),
                message,
            } => write!(f, "api error code={c}: {message}"),
            FetchError::Api {
                code: None,
                message,
            } => write!(f, "api error: {message}"),
            FetchError::Decode(msg) => write!(f, "decode error: {msg}"),
            FetchError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

// ---------------------------------------------------------------------------
// Run status
// ---------------------------------------------------------------------------

/// Overall outcome of one reconciliation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    /// No fatal errors; item-level rejections are still allowed.
    Success,
    /// Some batches exhausted retries, were skipped at the deadline, or
    /// unresolvable catalog entries were excluded.
    Partial,
    /// A fatal fetch error aborted the run before any update was attempted.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Partial => "PARTIAL",
            RunStatus::Failed => "FAILED",
        }
    }
}
