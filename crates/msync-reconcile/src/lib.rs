//! msync-reconcile
//!
//! Identity resolution + reconciliation engine.
//!
//! Architectural decisions:
//! - Every catalog entry yields exactly one resolved pair per sales model
//! - Listings absent from the source are zeroed, price untouched
//! - Already-zero listings are not re-zeroed (idempotent second run)
//! - No-op updates are suppressed before they reach the dispatcher
//! - Output order is (listing_id, sales_model), stable across runs
//!
//! Deterministic, pure logic. No IO. No marketplace calls.

mod engine;
mod resolver;
mod types;

pub use engine::compute_updates;
pub use resolver::{resolve, SkuLookup};
pub use types::*;
