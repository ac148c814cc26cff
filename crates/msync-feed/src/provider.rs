//! Provider boundary for source inventory truth.
//!
//! This module defines **only** the trait. No CSV logic, no normalization,
//! no marketplace knowledge.

use msync_schemas::{FetchError, SourceItem};

/// Upstream supplier of current inventory truth.
///
/// Implementations must be object-safe so callers can hold a
/// `Box<dyn SourceProvider>` without knowing the concrete type, and
/// `Send + Sync` so the run pipeline can use them across task boundaries.
///
/// A fetch failure is fatal for the run: there is nothing meaningful to
/// reconcile against.
pub trait SourceProvider: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"csv-feed"`).
    fn name(&self) -> &'static str;

    /// Fetch the complete current snapshot of source items.
    ///
    /// One item per (sku, sales_model); duplicates are an upstream defect
    /// and surface as [`FetchError::Decode`].
    fn fetch(&self) -> Result<Vec<SourceItem>, FetchError>;
}
