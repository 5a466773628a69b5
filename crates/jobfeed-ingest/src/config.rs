//! Configuration management
//!
//! Everything the function needs is read once at process start into an
//! [`IngestConfig`] and handed to the task explicitly.

use crate::adzuna::SearchConfig;
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// Default bind address for the custom handler.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Port used when the Functions host does not supply one.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Variable the Functions host sets to the port it forwards triggers to.
pub const CUSTOM_HANDLER_PORT_VAR: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    pub search: SearchConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Custom handler listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("JOBFEED_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: std::env::var(CUSTOM_HANDLER_PORT_VAR)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
        }
    }
}

impl IngestConfig {
    /// Load `.env` (if present) and the environment, then validate
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env();
        config.validate()?;

        Ok(config)
    }

    pub fn from_env() -> Self {
        Self {
            search: SearchConfig::from_env(),
            storage: StorageConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }

    /// Reject settings no run could succeed with
    ///
    /// Missing credentials only warn: they surface as a first-page or upload
    /// failure on invocation, which is reported to the caller.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.search.results_per_page == 0 {
            anyhow::bail!("ADZUNA_RESULTS_PER_PAGE must be greater than 0");
        }

        if self.search.country.trim().is_empty() {
            anyhow::bail!("ADZUNA_COUNTRY cannot be empty");
        }

        if self.storage.file_system.trim().is_empty() {
            anyhow::bail!("AZURE_STORAGE_FILESYSTEM cannot be empty");
        }

        if self.storage.directory.trim_matches('/').trim().is_empty() {
            anyhow::bail!("AZURE_STORAGE_DIRECTORY cannot be empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if !self.search.has_credentials() {
            tracing::warn!("ADZUNA_APP_ID or ADZUNA_APP_KEY is not set");
        }

        if !self.storage.has_credentials() {
            tracing::warn!("AZURE_STORAGE_ACCOUNT_NAME or AZURE_STORAGE_ACCOUNT_KEY is not set");
        }

        Ok(())
    }
}
