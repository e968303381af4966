//! Option source abstraction
//!
//! A widget does not care where its options come from. The lifecycle
//! controller wires one `OptionSource` per instance:
//!
//! ```text
//! OptionSource trait
//! ├── StaticSource (no remote endpoint configured, zero network calls)
//! └── RemoteSource (paginated remote search, see remote.rs)
//! ```
//!
//! The trait is object-safe so the controller can hold `Arc<dyn OptionSource>`
//! regardless of which variant a config selected; `fetch` returns a boxed
//! future for the same reason.

use futures::future::{self, BoxFuture};

use crate::error::SelectError;
use crate::options::{OptionItem, SearchPage, SearchRequest};

/// Where the widget's options come from
pub trait OptionSource: Send + Sync {
    /// Short human-readable name for logs
    fn describe(&self) -> &str;

    /// Resolve one search request to a result page.
    ///
    /// Errors are returned, not swallowed - the search pipeline decides how
    /// to degrade (it renders an empty page and reports the failure).
    fn fetch(&self, request: SearchRequest) -> BoxFuture<'_, Result<SearchPage, SelectError>>;
}

/// In-memory source used when no remote endpoint is configured.
///
/// Holds the statically supplied option list, with the optional preselected
/// option injected ahead of it. Search terms filter by case-insensitive
/// substring match on the label; everything fits on a single page.
pub struct StaticSource {
    options: Vec<OptionItem>,
}

impl StaticSource {
    pub fn new(options: Vec<OptionItem>, preselected: Option<OptionItem>) -> Self {
        let mut all = Vec::with_capacity(options.len() + 1);
        if let Some(pre) = preselected {
            all.push(pre);
        }
        all.extend(options);
        Self { options: all }
    }

    /// All options, preselected first
    pub fn options(&self) -> &[OptionItem] {
        &self.options
    }

    fn page_for(&self, term: &str) -> SearchPage {
        let term = term.trim().to_lowercase();
        let results = if term.is_empty() {
            self.options.clone()
        } else {
            self.options
                .iter()
                .filter(|o| o.label.to_lowercase().contains(&term))
                .cloned()
                .collect()
        };
        SearchPage {
            results,
            has_more: false,
        }
    }
}

impl OptionSource for StaticSource {
    fn describe(&self) -> &str {
        "static"
    }

    fn fetch(&self, request: SearchRequest) -> BoxFuture<'_, Result<SearchPage, SelectError>> {
        // Page numbers beyond the first are never requested because
        // has_more is always false, but answer them with an empty page
        // rather than repeating the data.
        let page = if request.page > 1 {
            SearchPage::empty()
        } else {
            self.page_for(&request.term)
        };
        Box::pin(future::ready(Ok(page)))
    }
}
