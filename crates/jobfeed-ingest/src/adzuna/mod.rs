//! Adzuna job search client
//!
//! Fetches single pages of a search; [`pagination`] walks the whole result
//! set. Job postings are kept as raw JSON and never inspected.

pub mod config;
pub mod pagination;

pub use config::SearchConfig;

use crate::error::SearchError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Total matches for the whole search; only read from page 1
    #[serde(default)]
    pub count: u64,

    #[serde(default)]
    pub results: Vec<Value>,
}

/// Client for the search endpoint
#[derive(Debug, Clone)]
pub struct AdzunaClient {
    http: Client,
    config: SearchConfig,
}

impl AdzunaClient {
    pub fn new(http: Client, config: SearchConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fetch one page
    ///
    /// Any non-2xx status becomes [`SearchError::Status`] carrying the
    /// response body, so callers can report exactly what the API said.
    pub async fn fetch_page(&self, page: u32) -> Result<SearchPage, SearchError> {
        let url = self.config.page_url(page);
        debug!(page, %url, "Requesting search page");

        let response = self
            .http
            .get(&url)
            .query(&self.config.params())
            .send()
            .await
            .map_err(SearchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(SearchError::Transport)?;
        serde_json::from_slice(&bytes).map_err(SearchError::Decode)
    }
}
