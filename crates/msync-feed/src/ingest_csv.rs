//! CSV-backed source provider.
//!
//! Converts a CSV file (or in-memory CSV text) into [`SourceItem`] values
//! using the normalization rules from [`crate::normalize`]. It is the read
//! side only: no marketplace calls, no reconciliation.
//!
//! ## CSV column contract (case-insensitive, order-independent)
//!
//! | Column        | Type / example   | Notes                                |
//! |---------------|------------------|--------------------------------------|
//! | `sku`         | `CAS-GW-M5610`   | Unique per (sku, sales_model)        |
//! | `quantity`    | `5`, `>10`, `1`  | Raw supplier encoding                |
//! | `price`       | `5'990.00 руб.`  | Decimal string; converted to micros  |
//! | `sales_model` | `FBS` (optional) | Empty / absent column means any      |

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use msync_schemas::{FetchError, SalesModel, SourceItem};

use crate::normalize::{price_to_micros, quantity_from_raw};
use crate::provider::SourceProvider;

/// Feed source reading a local CSV snapshot.
pub struct CsvFeedSource {
    path: PathBuf,
}

impl CsvFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceProvider for CsvFeedSource {
    fn name(&self) -> &'static str {
        "csv-feed"
    }

    fn fetch(&self) -> Result<Vec<SourceItem>, FetchError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            FetchError::Transport(format!("open feed {}: {e}", self.path.display()))
        })?;
        parse_items(file)
    }
}

/// Column indices resolved from the header row.
struct Columns {
    sku: usize,
    quantity: usize,
    price: usize,
    sales_model: Option<usize>,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns, FetchError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let required = |name: &'static str| {
        find(name).ok_or_else(|| FetchError::Decode(format!("feed csv missing column '{name}'")))
    };
    Ok(Columns {
        sku: required("sku")?,
        quantity: required("quantity")?,
        price: required("price")?,
        sales_model: find("sales_model"),
    })
}

fn parse_sales_model(raw: &str, row: usize) -> Result<Option<SalesModel>, FetchError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "" => Ok(None),
        "DEFAULT" => Ok(Some(SalesModel::Default)),
        "FBS" => Ok(Some(SalesModel::Fbs)),
        "DBS" => Ok(Some(SalesModel::Dbs)),
        other => Err(FetchError::Decode(format!(
            "feed csv row {row}: unknown sales_model '{other}'"
        ))),
    }
}

/// Parse feed rows from any reader. Exposed for tests and for providers
/// that fetch the same CSV shape over the network.
pub fn parse_items(reader: impl Read) -> Result<Vec<SourceItem>, FetchError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| FetchError::Decode(format!("feed csv headers: {e}")))?
        .clone();
    let cols = resolve_columns(&headers)?;

    let mut items = Vec::new();
    let mut seen: BTreeSet<(String, Option<SalesModel>)> = BTreeSet::new();

    for (i, rec) in rdr.records().enumerate() {
        // Header is row 1; data starts at row 2.
        let row = i + 2;
        let rec = rec.map_err(|e| FetchError::Decode(format!("feed csv row {row}: {e}")))?;

        let sku = rec
            .get(cols.sku)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FetchError::Decode(format!("feed csv row {row}: empty sku")))?
            .to_string();

        let quantity = quantity_from_raw(rec.get(cols.quantity).unwrap_or(""))
            .map_err(|e| FetchError::Decode(format!("feed csv row {row}: {e}")))?;

        let price_micros = price_to_micros(rec.get(cols.price).unwrap_or(""))
            .map_err(|e| FetchError::Decode(format!("feed csv row {row}: {e}")))?;

        let sales_model = match cols.sales_model {
            Some(idx) => parse_sales_model(rec.get(idx).unwrap_or(""), row)?,
            None => None,
        };

        if !seen.insert((sku.clone(), sales_model)) {
            return Err(FetchError::Decode(format!(
                "feed csv row {row}: duplicate sku '{sku}'"
            )));
        }

        items.push(SourceItem {
            sku,
            quantity,
            price_micros,
            sales_model,
        });
    }

    Ok(items)
}
