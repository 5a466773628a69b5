//! Search API configuration

use serde::{Deserialize, Serialize};
use std::env;

/// Root of the Adzuna jobs API; country and page number are appended.
pub const DEFAULT_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";

pub const DEFAULT_COUNTRY: &str = "ca";

/// Largest page size the API accepts.
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 50;

pub const DEFAULT_WHAT_PHRASE: &str = "data engineer";

/// Only listings posted within this many days are returned.
pub const DEFAULT_MAX_DAYS_OLD: u32 = 2;

pub const DEFAULT_SORT_BY: &str = "date";

/// Fixed parameters of every search request
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub base_url: String,
    pub country: String,
    pub app_id: String,
    pub app_key: String,
    pub results_per_page: u32,
    pub what_phrase: String,
    pub max_days_old: u32,
    pub sort_by: String,
}

/// Query string sent with each page request
#[derive(Debug, Serialize)]
pub struct SearchParams<'a> {
    pub app_id: &'a str,
    pub app_key: &'a str,
    pub results_per_page: u32,
    pub what_phrase: &'a str,
    pub max_days_old: u32,
    pub sort_by: &'a str,
}

impl SearchConfig {
    /// Load from environment variables, falling back to the defaults above
    ///
    /// Credentials default to empty strings; the API rejects them on the
    /// first page, which the task reports to the caller.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("ADZUNA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            country: env::var("ADZUNA_COUNTRY").unwrap_or_else(|_| DEFAULT_COUNTRY.to_string()),
            app_id: env::var("ADZUNA_APP_ID").unwrap_or_default(),
            app_key: env::var("ADZUNA_APP_KEY").unwrap_or_default(),
            results_per_page: env::var("ADZUNA_RESULTS_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RESULTS_PER_PAGE),
            what_phrase: env::var("ADZUNA_WHAT_PHRASE")
                .unwrap_or_else(|_| DEFAULT_WHAT_PHRASE.to_string()),
            max_days_old: env::var("ADZUNA_MAX_DAYS_OLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_DAYS_OLD),
            sort_by: env::var("ADZUNA_SORT_BY").unwrap_or_else(|_| DEFAULT_SORT_BY.to_string()),
        }
    }

    /// Borrow the query parameters shared by all pages
    pub fn params(&self) -> SearchParams<'_> {
        SearchParams {
            app_id: &self.app_id,
            app_key: &self.app_key,
            results_per_page: self.results_per_page,
            what_phrase: &self.what_phrase,
            max_days_old: self.max_days_old,
            sort_by: &self.sort_by,
        }
    }

    /// URL of one result page; the page number is a path segment
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}/{}/search/{}",
            self.base_url.trim_end_matches('/'),
            self.country,
            page
        )
    }

    pub fn has_credentials(&self) -> bool {
        !self.app_id.is_empty() && !self.app_key.is_empty()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            app_id: String::new(),
            app_key: String::new(),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            what_phrase: DEFAULT_WHAT_PHRASE.to_string(),
            max_days_old: DEFAULT_MAX_DAYS_OLD,
            sort_by: DEFAULT_SORT_BY.to_string(),
        }
    }
}

// app_key stays out of logs
impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .field("results_per_page", &self.results_per_page)
            .field("what_phrase", &self.what_phrase)
            .field("max_days_old", &self.max_days_old)
            .field("sort_by", &self.sort_by)
            .finish()
    }
}
