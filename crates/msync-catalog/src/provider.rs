//! Catalog provider trait and the pagination driver.

use std::collections::BTreeSet;

use msync_schemas::{CatalogEntry, FetchError};
use tracing::debug;

/// One page of catalog listings.
#[derive(Clone, Debug)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    /// Opaque cursor for the next page; `None` when this page is the last.
    pub next_cursor: Option<String>,
}

/// Paginated supplier of the marketplace's current listings.
///
/// Implementations must be object-safe (`Box<dyn CatalogProvider>`) and
/// `Send + Sync`. A page failure is fatal for the run: reconciling against
/// a partial catalog would zero out every listing the missing pages hold.
pub trait CatalogProvider: Send + Sync {
    /// Human-readable name identifying this catalog (e.g. `"ozon"`).
    fn name(&self) -> &'static str;

    /// Fetch one page. `cursor: None` requests the first page.
    fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError>;
}

/// Drive pagination to completion and return the full snapshot.
///
/// A cursor that repeats aborts the fetch: the originals' "loop until the
/// token comes back empty" pattern hangs forever against a server that
/// echoes the same token, so repetition is treated as a malformed response.
pub fn fetch_full_catalog(provider: &dyn CatalogProvider) -> Result<Vec<CatalogEntry>, FetchError> {
    let mut entries = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen_cursors: BTreeSet<String> = BTreeSet::new();
    let mut pages = 0usize;

    loop {
        let page = provider.list_page(cursor.as_deref())?;
        pages += 1;
        debug!(
            catalog = provider.name(),
            page = pages,
            entries = page.entries.len(),
            "catalog page fetched"
        );
        entries.extend(page.entries);

        match page.next_cursor {
            None => break,
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(FetchError::Decode(format!(
                        "catalog '{}' repeated page cursor '{next}'",
                        provider.name()
                    )));
                }
                cursor = Some(next);
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msync_schemas::SalesModel;

    fn entry(listing_id: &str) -> CatalogEntry {
        CatalogEntry {
            listing_id: listing_id.to_string(),
            sku: Some(listing_id.to_string()),
            sales_model: SalesModel::Default,
            current_quantity: 1,
            current_price_micros: 10_000_000,
        }
    }

    /// Serves a scripted sequence of pages keyed by cursor.
    struct ScriptedCatalog {
        pages: Vec<(Option<&'static str>, CatalogPage)>,
    }

    impl CatalogProvider for ScriptedCatalog {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError> {
            self.pages
                .iter()
                .find(|(c, _)| *c == cursor)
                .map(|(_, p)| p.clone())
                .ok_or_else(|| FetchError::Api {
                    code: None,
                    message: format!("unknown cursor {cursor:?}"),
                })
        }
    }

    #[test]
    fn drives_pagination_to_completion() {
        let provider = ScriptedCatalog {
            pages: vec![
                (
                    None,
                    CatalogPage {
                        entries: vec![entry("L1"), entry("L2")],
                        next_cursor: Some("p2".to_string()),
                    },
                ),
                (
                    Some("p2"),
                    CatalogPage {
                        entries: vec![entry("L3")],
                        next_cursor: None,
                    },
                ),
            ],
        };
        let entries = fetch_full_catalog(&provider).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].listing_id, "L3");
    }

    #[test]
    fn repeated_cursor_aborts_instead_of_looping() {
        let provider = ScriptedCatalog {
            pages: vec![(
                None,
                CatalogPage {
                    entries: vec![entry("L1")],
                    next_cursor: Some("".to_string()),
                },
            ),
            (
                Some(""),
                CatalogPage {
                    entries: vec![entry("L1")],
                    next_cursor: Some("".to_string()),
                },
            )],
        };
        let err = fetch_full_catalog(&provider).unwrap_err();
        assert!(err.to_string().contains("repeated page cursor"), "got: {err}");
    }

    #[test]
    fn page_error_is_fatal() {
        let provider = ScriptedCatalog { pages: vec![] };
        assert!(fetch_full_catalog(&provider).is_err());
    }
}
