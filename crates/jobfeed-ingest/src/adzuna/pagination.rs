//! Walking a paginated search
//!
//! Page 1 decides how many pages exist. Later pages are fetched one after
//! another; a page that fails is recorded and skipped, never retried, so a
//! harvest can be partial.

use super::AdzunaClient;
use crate::error::SearchError;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Number of pages needed for `total_count` items, `page_size` at a time
///
/// A page size of zero yields zero pages.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// A page after the first that contributed no items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub page: u32,
    /// Upstream status, absent when no response arrived
    pub status: Option<u16>,
    pub detail: String,
}

impl PageFailure {
    fn from_error(page: u32, err: &SearchError) -> Self {
        let detail = match err {
            SearchError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        };
        Self {
            page,
            status: err.status().map(|s| s.as_u16()),
            detail,
        }
    }
}

/// Everything collected from one search
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    /// Postings in retrieval order: page ascending, API order within a page
    pub items: Vec<Value>,
    pub total_count: u64,
    pub total_pages: u32,
    pub failed_pages: Vec<PageFailure>,
}

impl Harvest {
    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

/// Fetch every page of the configured search
///
/// Fails only when page 1 fails; later failures end up in
/// [`Harvest::failed_pages`].
#[instrument(skip_all)]
pub async fn harvest(client: &AdzunaClient) -> Result<Harvest, SearchError> {
    info!("Requesting page 1 to determine the total number of pages");
    let first = client.fetch_page(1).await?;

    let page_size = client.config().results_per_page;
    let mut harvest = Harvest {
        total_count: first.count,
        total_pages: total_pages(first.count, page_size),
        ..Harvest::default()
    };
    info!(
        total_count = harvest.total_count,
        total_pages = harvest.total_pages,
        "Search sized"
    );

    harvest.items.extend(first.results);

    for page in 2..=harvest.total_pages {
        match client.fetch_page(page).await {
            Ok(data) => harvest.items.extend(data.results),
            Err(err) => {
                let failure = PageFailure::from_error(page, &err);
                warn!(
                    page,
                    status = ?failure.status,
                    body = %failure.detail,
                    "Error fetching page, skipping it"
                );
                harvest.failed_pages.push(failure);
            },
        }
    }

    info!(
        items = harvest.items.len(),
        skipped_pages = harvest.failed_pages.len(),
        "Total jobs retrieved"
    );

    Ok(harvest)
}
