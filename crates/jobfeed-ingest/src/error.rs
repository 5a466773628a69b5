//! Error types for the ingestion function
//!
//! Each layer has its own enum: [`SearchError`] for the job search API,
//! [`StorageError`] for the Data Lake, and [`IngestError`] for the task as a
//! whole. Only `IngestError` knows how failures map onto trigger responses.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failure fetching one page of search results
#[derive(Error, Debug)]
pub enum SearchError {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{}, {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    /// The API answered 2xx but the body is not a search page
    #[error("unreadable response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl SearchError {
    /// Upstream status, when the API produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SearchError::Status { status, .. } => Some(*status),
            SearchError::Transport(err) => err.status(),
            SearchError::Decode(_) => None,
        }
    }
}

/// Failure talking to the hierarchical object store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid storage account key: {0}")]
    InvalidAccountKey(String),

    #[error("invalid storage endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The path was created earlier; tolerated for directories only
    #[error("path '{path}' already exists")]
    AlreadyExists { path: String },

    #[error("{operation} '{path}' failed with status {}: {code}: {message}", .status.as_u16())]
    Service {
        operation: &'static str,
        path: String,
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("{operation} '{path}' failed: {source}")]
    Transport {
        operation: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Task-level failure, one per trigger outcome that is not a success
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Error fetching page 1: {0}")]
    FirstPage(#[source] SearchError),

    #[error("Error generating or uploading JSON file to ADLS Gen2: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Error generating or uploading JSON file to ADLS Gen2: {0}")]
    Upload(#[from] StorageError),
}

impl IngestError {
    /// Status code returned to the trigger caller
    ///
    /// A first-page rejection mirrors the upstream status; a first page that
    /// never arrived (or arrived unreadable) is a bad gateway; everything on
    /// the storage side is an internal error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::FirstPage(SearchError::Status { status, .. }) => *status,
            IngestError::FirstPage(_) => StatusCode::BAD_GATEWAY,
            IngestError::Encode(_) | IngestError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
