//! Storage account and target location

use serde::{Deserialize, Serialize};
use std::env;

/// File system (container) the raw documents land in.
pub const DEFAULT_FILE_SYSTEM: &str = "raw-data";

/// Directory inside the file system.
pub const DEFAULT_DIRECTORY: &str = "json";

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub account_name: String,
    /// Base64 Shared Key of the storage account
    pub account_key: String,
    /// Overrides `https://{account_name}.dfs.core.windows.net`
    pub endpoint: Option<String>,
    pub file_system: String,
    pub directory: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            account_name: env::var("AZURE_STORAGE_ACCOUNT_NAME").unwrap_or_default(),
            account_key: env::var("AZURE_STORAGE_ACCOUNT_KEY").unwrap_or_default(),
            endpoint: env::var("AZURE_STORAGE_ENDPOINT").ok().filter(|e| !e.is_empty()),
            file_system: env::var("AZURE_STORAGE_FILESYSTEM")
                .unwrap_or_else(|_| DEFAULT_FILE_SYSTEM.to_string()),
            directory: env::var("AZURE_STORAGE_DIRECTORY")
                .unwrap_or_else(|_| DEFAULT_DIRECTORY.to_string()),
        }
    }

    /// Point at a local endpoint such as a mock server
    pub fn for_endpoint(
        endpoint: impl Into<String>,
        account_name: impl Into<String>,
        account_key: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            endpoint: Some(endpoint.into()),
            file_system: DEFAULT_FILE_SYSTEM.to_string(),
            directory: DEFAULT_DIRECTORY.to_string(),
        }
    }

    /// DFS endpoint all requests are sent to
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.dfs.core.windows.net", self.account_name),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.account_name.is_empty() && !self.account_key.is_empty()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_name: String::new(),
            account_key: String::new(),
            endpoint: None,
            file_system: DEFAULT_FILE_SYSTEM.to_string(),
            directory: DEFAULT_DIRECTORY.to_string(),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("file_system", &self.file_system)
            .field("directory", &self.directory)
            .finish()
    }
}
