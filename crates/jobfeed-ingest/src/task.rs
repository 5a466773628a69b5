//! The ingestion task
//!
//! One invocation: harvest every page of the search, wrap the postings in a
//! single-key envelope, and land the bytes as a new timestamped file in the
//! Data Lake. Invocations share nothing but the configuration, and each one
//! writes a file of its own.

use crate::adzuna::{pagination, pagination::PageFailure, AdzunaClient};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result, StorageError};
use crate::storage::{DataLakeClient, FileClient};
use chrono::{DateTime, Local, TimeZone};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::{fmt::Display, sync::Arc};
use tracing::{error, info, instrument, warn};

pub const ARTIFACT_PREFIX: &str = "adzuna_raw_data_";

/// `adzuna_raw_data_YYYYMMDD_HHMMSS.json` for the given instant
pub fn artifact_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("{}{}.json", ARTIFACT_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

#[derive(Serialize)]
struct Envelope<'a> {
    items: &'a [Value],
}

/// Serialize postings as `{"items": [...]}`
pub fn encode_envelope(items: &[Value]) -> std::result::Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&Envelope { items })
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub file_name: String,
    /// `{file_system}/{directory}/{file_name}`
    pub path: String,
    pub items: usize,
    pub total_pages: u32,
    pub bytes: u64,
    /// Pages that were skipped; non-empty means the file is partial
    pub failed_pages: Vec<PageFailure>,
}

impl IngestReport {
    /// Message returned to the trigger caller
    pub fn message(&self) -> String {
        format!(
            "JSON file '{}' generated and uploaded successfully to ADLS Gen2.",
            self.file_name
        )
    }
}

#[derive(Debug, Clone)]
pub struct IngestTask {
    config: Arc<IngestConfig>,
    http: Client,
}

impl IngestTask {
    pub fn new(config: Arc<IngestConfig>, http: Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one extract-and-land pass
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<IngestReport> {
        info!("Ingestion triggered");

        let search = AdzunaClient::new(self.http.clone(), self.config.search.clone());
        let harvest = pagination::harvest(&search).await.map_err(|err| {
            error!(error = %err, "Error fetching page 1");
            IngestError::FirstPage(err)
        })?;

        if harvest.is_partial() {
            let skipped: Vec<u32> = harvest.failed_pages.iter().map(|f| f.page).collect();
            warn!(?skipped, "Uploading a partial dataset");
        }

        let payload = encode_envelope(&harvest.items)?;
        let bytes = payload.len() as u64;

        // Named after the moment the payload is ready, not the trigger time
        let file_name = artifact_name(&Local::now());
        info!(%file_name, bytes, "Storing raw data");

        let path = self.upload(&file_name, payload).await.map_err(|err| {
            error!(error = %err, "Error uploading file");
            IngestError::Upload(err)
        })?;

        info!(%path, "File successfully uploaded");

        Ok(IngestReport {
            file_name,
            path,
            items: harvest.items.len(),
            total_pages: harvest.total_pages,
            bytes,
            failed_pages: harvest.failed_pages,
        })
    }

    /// Create directory if absent, then create, append and flush the file
    async fn upload(
        &self,
        file_name: &str,
        payload: Vec<u8>,
    ) -> std::result::Result<String, StorageError> {
        let storage = &self.config.storage;

        let client = DataLakeClient::new(self.http.clone(), storage)?;
        let directory = client
            .file_system(storage.file_system.as_str())
            .directory(&storage.directory);
        directory.create_if_absent().await?;

        // A file already at this path belongs to another run and is left alone
        let file = directory.file(file_name);
        file.create().await?;

        let length = payload.len() as u64;
        if let Err(err) = write_contents(&file, payload, length).await {
            discard(&file).await;
            return Err(err);
        }

        Ok(file.path().to_string())
    }
}

async fn write_contents(
    file: &FileClient,
    payload: Vec<u8>,
    length: u64,
) -> std::result::Result<(), StorageError> {
    file.append(payload, 0).await?;
    file.flush(length).await
}

/// Remove a file whose contents never got flushed
async fn discard(file: &FileClient) {
    match file.delete().await {
        Ok(()) => warn!(path = %file.path(), "Removed unfinished file"),
        Err(err) => error!(path = %file.path(), error = %err, "Could not remove unfinished file"),
    }
}
