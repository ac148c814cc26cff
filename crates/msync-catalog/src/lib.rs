//! msync-catalog
//!
//! Marketplace catalog boundary: the provider trait, the pagination driver
//! that collects a complete snapshot before reconciliation starts, and the
//! lookup indexes the resolver and engine consume.
//!
//! No HTTP here; concrete providers live in the marketplace adapter crates.

pub mod index;
pub mod provider;

pub use index::{index_catalog, index_source};
pub use provider::{fetch_full_catalog, CatalogPage, CatalogProvider};
