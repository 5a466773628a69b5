//! Jobfeed Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Lands Adzuna job-search results in Azure Data Lake Storage Gen2.
//!
//! One run fetches every page of a fixed search, concatenates the postings
//! into `{"items": [...]}` and writes that document to
//! `raw-data/json/adzuna_raw_data_<YYYYMMDD_HHMMSS>.json`.
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_ingest::{config::IngestConfig, task::IngestTask};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(IngestConfig::load()?);
//!     let task = IngestTask::new(config, reqwest::Client::new());
//!
//!     let report = task.run().await?;
//!     println!("{}", report.message());
//!     Ok(())
//! }
//! ```

pub mod adzuna;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;
pub mod task;

pub use error::{IngestError, Result, SearchError, StorageError};
