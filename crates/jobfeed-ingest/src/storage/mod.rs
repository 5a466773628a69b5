//! Hierarchical object store (ADLS Gen2) client
//!
//! Mirrors the store's own hierarchy: a [`DataLakeClient`] hands out
//! [`FileSystemClient`]s, which hand out [`DirectoryClient`]s, which hand out
//! [`FileClient`]s. Handles are cheap; nothing is contacted until an
//! operation is awaited.
//!
//! Writing a file is three calls: create (empty, never over an existing
//! path), append at an offset, then flush at the final length. Until the
//! flush succeeds the file reads as empty.

pub mod auth;
pub mod config;

pub use auth::{SharedKeyCredential, STORAGE_API_VERSION};
pub use config::StorageConfig;

use crate::error::StorageError;
use chrono::Utc;
use reqwest::{header::IF_NONE_MATCH, Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

const ERROR_CODE_HEADER: &str = "x-ms-error-code";

/// Error code returned with 409 when a path is created twice.
pub const PATH_ALREADY_EXISTS: &str = "PathAlreadyExists";

/// Authenticated connection to one storage account
#[derive(Debug, Clone)]
pub struct DataLakeClient {
    http: Client,
    endpoint: Url,
    credential: Arc<SharedKeyCredential>,
}

impl DataLakeClient {
    /// Build a client; fails when the endpoint or account key is unusable
    pub fn new(http: Client, config: &StorageConfig) -> Result<Self, StorageError> {
        let endpoint_str = config.endpoint_url();
        let endpoint = Url::parse(&endpoint_str).map_err(|e| StorageError::InvalidEndpoint {
            endpoint: endpoint_str.clone(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::InvalidEndpoint {
                endpoint: endpoint_str,
                reason: "not a base URL".to_string(),
            });
        }

        let credential = SharedKeyCredential::new(&config.account_name, &config.account_key)?;

        debug!(%endpoint, account = %config.account_name, "Data Lake client initialized");

        Ok(Self {
            http,
            endpoint,
            credential: Arc::new(credential),
        })
    }

    pub fn file_system(&self, name: impl Into<String>) -> FileSystemClient {
        FileSystemClient {
            client: self.clone(),
            name: name.into(),
        }
    }

    fn url_for(&self, path: &str) -> Url {
        let mut url = self.endpoint.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url_for(path))
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(
                "x-ms-date",
                Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            )
    }

    /// Sign and send; any non-2xx status becomes [`StorageError::Service`]
    async fn execute(
        &self,
        operation: &'static str,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, StorageError> {
        let transport = |source: reqwest::Error| StorageError::Transport {
            operation,
            path: path.to_string(),
            source,
        };

        let mut request = builder.build().map_err(transport)?;
        self.credential.authorize(&mut request)?;

        debug!(operation, method = %request.method(), url = %request.url(), "Sending storage request");

        let response = self.http.execute(request).await.map_err(transport)?;
        if response.status().is_success() {
            return Ok(response);
        }

        Err(service_error(operation, path, response).await)
    }

    /// `PUT ?resource=` guarded by `If-None-Match: *`; an existing path is
    /// never replaced
    async fn create_path(
        &self,
        operation: &'static str,
        path: &str,
        resource: &str,
    ) -> Result<(), StorageError> {
        let builder = self
            .request(Method::PUT, path)
            .query(&[("resource", resource)])
            .header(IF_NONE_MATCH, "*")
            .body(Vec::new());

        match self.execute(operation, path, builder).await {
            Ok(_) => Ok(()),
            Err(StorageError::Service { status, code, .. })
                if status == StatusCode::CONFLICT && code == PATH_ALREADY_EXISTS =>
            {
                Err(StorageError::AlreadyExists {
                    path: path.to_string(),
                })
            },
            Err(err) => Err(err),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

async fn service_error(operation: &'static str, path: &str, response: Response) -> StorageError {
    let status = response.status();
    let header_code = response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body).ok().map(|b| b.error);

    let code = header_code
        .or_else(|| {
            detail
                .as_ref()
                .map(|d| d.code.clone())
                .filter(|c| !c.is_empty())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    let message = detail
        .map(|d| d.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(body);

    StorageError::Service {
        operation,
        path: path.to_string(),
        status,
        code,
        message,
    }
}

/// A file system (container)
#[derive(Debug, Clone)]
pub struct FileSystemClient {
    client: DataLakeClient,
    name: String,
}

impl FileSystemClient {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self, name: &str) -> DirectoryClient {
        DirectoryClient {
            client: self.client.clone(),
            path: format!("{}/{}", self.name, name.trim_matches('/')),
        }
    }
}

/// A directory inside a file system
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: DataLakeClient,
    path: String,
}

impl DirectoryClient {
    /// `{file_system}/{directory}`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create the directory, failing with [`StorageError::AlreadyExists`]
    /// when it is already there
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn create(&self) -> Result<(), StorageError> {
        self.client
            .create_path("create directory", &self.path, "directory")
            .await
    }

    /// Create the directory unless it exists; `true` when it was created
    pub async fn create_if_absent(&self) -> Result<bool, StorageError> {
        match self.create().await {
            Ok(()) => {
                info!(path = %self.path, "Directory created");
                Ok(true)
            },
            Err(StorageError::AlreadyExists { path }) => {
                info!(%path, "Directory already exists");
                Ok(false)
            },
            Err(err) => Err(err),
        }
    }

    pub fn file(&self, name: &str) -> FileClient {
        FileClient {
            client: self.client.clone(),
            path: format!("{}/{}", self.path, name.trim_matches('/')),
        }
    }
}

/// A file inside a directory
#[derive(Debug, Clone)]
pub struct FileClient {
    client: DataLakeClient,
    path: String,
}

impl FileClient {
    /// `{file_system}/{directory}/{file}`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create an empty file, failing with [`StorageError::AlreadyExists`]
    /// when any file is already at this path
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn create(&self) -> Result<(), StorageError> {
        self.client
            .create_path("create file", &self.path, "file")
            .await
    }

    /// Stage `data` at `offset`; invisible to readers until flushed
    #[instrument(skip(self, data), fields(path = %self.path, bytes = data.len()))]
    pub async fn append(&self, data: Vec<u8>, offset: u64) -> Result<(), StorageError> {
        let position = offset.to_string();
        let builder = self
            .client
            .request(Method::PATCH, &self.path)
            .query(&[("action", "append"), ("position", position.as_str())])
            .body(data);

        self.client.execute("append", &self.path, builder).await?;
        Ok(())
    }

    /// Commit everything appended so far; `position` is the final length
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn flush(&self, position: u64) -> Result<(), StorageError> {
        let position = position.to_string();
        let builder = self
            .client
            .request(Method::PATCH, &self.path)
            .query(&[("action", "flush"), ("position", position.as_str())])
            .body(Vec::new());

        self.client.execute("flush", &self.path, builder).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn delete(&self) -> Result<(), StorageError> {
        let builder = self.client.request(Method::DELETE, &self.path);

        self.client.execute("delete", &self.path, builder).await?;
        Ok(())
    }
}
