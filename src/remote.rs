// Remote query adapter - paginated search against an HTTP endpoint
//
// Speaks the searchable-dropdown wire contract:
//   GET <base_url>?search=<term>&page=<n>
//   -> { "results": [{"id", "text", ...}], "pagination": {"more": bool} }
//
// Debouncing is the controller's job, not this adapter's; the adapter only
// builds requests and parses pages. Failures come back as typed errors so
// the search pipeline can degrade to an empty page without ever leaving the
// widget in a loading state.

use futures::future::BoxFuture;
use std::time::Duration;

use crate::error::SelectError;
use crate::options::{SearchPage, SearchRequest};
use crate::source::OptionSource;

/// Request timeout for a single page fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote search source backed by a reqwest client
pub struct RemoteSource {
    client: reqwest::Client,
    base_url: String,
    label_field: String,
}

impl RemoteSource {
    /// Create a source for `base_url`, resolving labels through
    /// `label_field` when the payload carries no `text`.
    pub fn new(base_url: impl Into<String>, label_field: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
            label_field: label_field.into(),
        }
    }

    /// The endpoint this source queries
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_page(&self, request: SearchRequest) -> Result<SearchPage, SelectError> {
        let page = request.page.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search", request.term.as_str()),
                ("page", page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SelectError::Network(format!("{}: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SelectError::Network(format!(
                "{} returned {}",
                self.base_url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SelectError::Network(format!("reading body: {}", e)))?;

        SearchPage::from_json(&body, &self.label_field)
    }
}

impl OptionSource for RemoteSource {
    fn describe(&self) -> &str {
        "remote"
    }

    fn fetch(&self, request: SearchRequest) -> BoxFuture<'_, Result<SearchPage, SelectError>> {
        tracing::debug!(
            url = %self.base_url,
            term = %request.term,
            page = request.page,
            "Fetching result page"
        );
        Box::pin(self.fetch_page(request))
    }
}
