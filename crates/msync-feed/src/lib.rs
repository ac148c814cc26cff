//! msync-feed
//!
//! Source-of-truth boundary: the supplier inventory feed.
//!
//! This crate defines the provider trait, the raw-value normalization rules
//! (supplier quantity strings, price strings with grouping/currency noise),
//! and a CSV-backed provider. It does **not** talk to marketplaces, resolve
//! SKUs, or compute updates.

pub mod ingest_csv;
pub mod normalize;
pub mod provider;

pub use ingest_csv::CsvFeedSource;
pub use normalize::{price_to_micros, quantity_from_raw, NormalizeError};
pub use provider::SourceProvider;
