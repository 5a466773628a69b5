//! Shared fixtures for integration tests
//!
//! One `MockServer` stands in for both the search API (`/ca/search/{page}`)
//! and the Data Lake DFS endpoint (`/raw-data/...`).
#![allow(dead_code)]

use jobfeed_ingest::{
    adzuna::SearchConfig,
    config::{IngestConfig, ServerConfig},
    storage::StorageConfig,
    task::IngestTask,
};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::{
    matchers::{header, method, path, path_regex, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const APP_ID: &str = "test-app-id";
pub const APP_KEY: &str = "test-app-key";
pub const ACCOUNT: &str = "devaccount";
// base64("test-account-key")
pub const ACCOUNT_KEY: &str = "dGVzdC1hY2NvdW50LWtleQ==";

pub const DIRECTORY_PATH: &str = "/raw-data/json";
pub const FILE_PATH_PATTERN: &str = r"^/raw-data/json/adzuna_raw_data_\d{8}_\d{6}\.json$";

pub fn test_config(server: &MockServer) -> IngestConfig {
    IngestConfig {
        search: SearchConfig {
            base_url: server.uri(),
            app_id: APP_ID.to_string(),
            app_key: APP_KEY.to_string(),
            ..SearchConfig::default()
        },
        storage: StorageConfig::for_endpoint(server.uri(), ACCOUNT, ACCOUNT_KEY),
        server: ServerConfig::default(),
    }
}

pub fn task_for(config: IngestConfig) -> IngestTask {
    IngestTask::new(Arc::new(config), reqwest::Client::new())
}

pub fn test_task(server: &MockServer) -> IngestTask {
    task_for(test_config(server))
}

/// `count` postings tagged with their page, e.g. `p2-0`, `p2-1`
pub fn postings(page: u32, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("p{}-{}", page, i),
                "title": "Data Engineer",
                "location": {"area": ["Canada", "Ontario"]},
            })
        })
        .collect()
}

// ============================================================================
// Search API
// ============================================================================

pub async fn mount_page(server: &MockServer, page: u32, total_count: u64, results: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/ca/search/{}", page)))
        .and(query_param("app_id", APP_ID))
        .and(query_param("app_key", APP_KEY))
        .and(query_param("results_per_page", "50"))
        .and(query_param("what_phrase", "data engineer"))
        .and(query_param("max_days_old", "2"))
        .and(query_param("sort_by", "date"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "__CLASS__": "Adzuna::API::Response::JobSearchResults",
                "count": total_count,
                "mean": 91234.5,
                "results": results,
            })),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_failed_page(server: &MockServer, page: u32, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/ca/search/{}", page)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn forbid_page(server: &MockServer, page: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/ca/search/{}", page)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

// ============================================================================
// Data Lake
// ============================================================================

pub fn storage_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("x-ms-error-code", code)
        .set_body_json(json!({"error": {"code": code, "message": message}}))
}

pub async fn mount_directory(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("PUT"))
        .and(path(DIRECTORY_PATH))
        .and(query_param("resource", "directory"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_file_create(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("PUT"))
        .and(path_regex(FILE_PATH_PATTERN))
        .and(query_param("resource", "file"))
        .and(header("if-none-match", "*"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mount_append(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("PATCH"))
        .and(path_regex(FILE_PATH_PATTERN))
        .and(query_param("action", "append"))
        .and(query_param("position", "0"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mount_flush(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("PATCH"))
        .and(path_regex(FILE_PATH_PATTERN))
        .and(query_param("action", "flush"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mount_delete(server: &MockServer, expected: u64) {
    Mock::given(method("DELETE"))
        .and(path_regex(FILE_PATH_PATTERN))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .mount(server)
        .await;
}

/// Directory, create, append and flush all succeed; nothing is deleted
pub async fn mount_storage_ok(server: &MockServer) {
    mount_directory(server, ResponseTemplate::new(201)).await;
    mount_file_create(server, ResponseTemplate::new(201), 1).await;
    mount_append(server, ResponseTemplate::new(202), 1).await;
    mount_flush(server, ResponseTemplate::new(200), 1).await;
    mount_delete(server, 0).await;
}

/// No request may reach the Data Lake
pub async fn forbid_storage(server: &MockServer) {
    Mock::given(path_regex(r"^/raw-data"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(server)
        .await;
}

fn storage_requests_with(requests: &[wiremock::Request], action: &str) -> Vec<wiremock::Request> {
    requests
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .filter(|r| r.url.query_pairs().any(|(k, v)| k == "action" && v == action))
        .cloned()
        .collect()
}

/// Body of the single append request, decoded as JSON
pub async fn uploaded_document(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let appends = storage_requests_with(&requests, "append");
    assert_eq!(appends.len(), 1, "expected exactly one append");
    serde_json::from_slice(&appends[0].body).unwrap()
}

/// `(append body length, flush position)` of the upload
pub async fn append_and_flush_lengths(server: &MockServer) -> (usize, u64) {
    let requests = server.received_requests().await.unwrap();
    let appends = storage_requests_with(&requests, "append");
    let flushes = storage_requests_with(&requests, "flush");
    assert_eq!(flushes.len(), 1, "expected exactly one flush");

    let position = flushes[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "position")
        .map(|(_, v)| v.parse::<u64>().unwrap())
        .unwrap();

    (appends[0].body.len(), position)
}

/// Posting ids of an uploaded document, in order
pub fn ids(document: &Value) -> Vec<String> {
    document["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

pub fn expected_ids(pages: &[(u32, usize)]) -> Vec<String> {
    pages
        .iter()
        .flat_map(|&(page, count)| postings(page, count))
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}
