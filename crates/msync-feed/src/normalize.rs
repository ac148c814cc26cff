//! Canonical normalization of raw supplier feed values.
//!
//! The supplier feed encodes quantities and prices as display strings, not
//! numbers. This module converts them deterministically:
//!
//! - quantity `">10"` means "plenty in stock" and normalizes to `100`;
//! - quantity `"1"` means "last unit, do not sell" and normalizes to `0`;
//! - any other quantity parses as a plain integer;
//! - prices like `"5'990.00 руб."` drop the fractional part and every
//!   non-digit, then convert to integer micros.
//!
//! No floating point at any stage.

use std::fmt;

use msync_schemas::MICROS_SCALE;

/// Quantity value the feed uses for "more than ten in stock".
const PLENTY_QUANTITY: i64 = 100;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced during feed-value normalization.
#[derive(Debug, PartialEq, Eq)]
pub enum NormalizeError {
    /// A quantity string was empty or not an integer.
    InvalidQuantity { raw: String },
    /// A price string contained no digits before the decimal point.
    EmptyPrice { raw: String },
    /// A price overflowed the micros range.
    PriceOverflow { raw: String },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::InvalidQuantity { raw } => {
                write!(f, "quantity could not be parsed: '{raw}'")
            }
            NormalizeError::EmptyPrice { raw } => {
                write!(f, "price contains no digits: '{raw}'")
            }
            NormalizeError::PriceOverflow { raw } => {
                write!(f, "price does not fit in micros range: '{raw}'")
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// Normalize a raw feed quantity string.
///
/// Rules (supplier feed contract):
/// - `">10"` -> `100`
/// - `"1"`   -> `0` (a single remaining unit is treated as sold out)
/// - otherwise the string must parse as an integer.
///
/// Negative integers are passed through; clamping to zero is the engine's
/// decision, which also records the warning.
pub fn quantity_from_raw(raw: &str) -> Result<i64, NormalizeError> {
    let t = raw.trim();
    match t {
        ">10" => Ok(PLENTY_QUANTITY),
        "1" => Ok(0),
        _ => t.parse::<i64>().map_err(|_| NormalizeError::InvalidQuantity {
            raw: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Convert a supplier price string to integer micros.
///
/// The fractional part (everything from the first `.`) is discarded, then
/// every non-digit is stripped: `"5'990.00 руб."` -> `5990` units ->
/// `5_990_000_000` micros.
pub fn price_to_micros(raw: &str) -> Result<i64, NormalizeError> {
    let integral = raw.split('.').next().unwrap_or("");
    let digits: String = integral.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(NormalizeError::EmptyPrice {
            raw: raw.to_string(),
        });
    }
    let units: i64 = digits
        .parse()
        .map_err(|_| NormalizeError::PriceOverflow {
            raw: raw.to_string(),
        })?;
    units
        .checked_mul(MICROS_SCALE)
        .ok_or(NormalizeError::PriceOverflow {
            raw: raw.to_string(),
        })
}
