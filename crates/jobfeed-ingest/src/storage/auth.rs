//! Shared Key authorization for Data Lake requests
//!
//! Each request is signed with HMAC-SHA256 over a canonical description of
//! the request (verb, standard headers, `x-ms-*` headers, resource path and
//! query), keyed with the decoded storage account key.

use crate::error::StorageError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Request,
};
use sha2::Sha256;
use std::collections::BTreeMap;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// REST API version sent as `x-ms-version`.
pub const STORAGE_API_VERSION: &str = "2021-08-06";

#[derive(Clone)]
pub struct SharedKeyCredential {
    account_name: String,
    mac: HmacSha256,
}

impl SharedKeyCredential {
    pub fn new(account_name: impl Into<String>, account_key: &str) -> Result<Self, StorageError> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| StorageError::InvalidAccountKey(e.to_string()))?;
        if key.is_empty() {
            return Err(StorageError::InvalidAccountKey("key is empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| StorageError::InvalidAccountKey(e.to_string()))?;

        Ok(Self {
            account_name: account_name.into(),
            mac,
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Base64 HMAC-SHA256 of `string_to_sign`
    pub fn sign(&self, string_to_sign: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(string_to_sign.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Add the `Authorization` header to a fully built request
    ///
    /// Must run last: any header or body change afterwards invalidates the
    /// signature.
    pub fn authorize(&self, request: &mut Request) -> Result<(), StorageError> {
        let signature = self.sign(&string_to_sign(request, &self.account_name));
        let value = HeaderValue::from_str(&format!(
            "SharedKey {}:{}",
            self.account_name, signature
        ))
        .map_err(|e| StorageError::InvalidAccountKey(format!("unusable account name: {}", e)))?;

        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account_name", &self.account_name)
            .finish_non_exhaustive()
    }
}

/// Canonical request description the signature is computed over
pub fn string_to_sign(request: &Request, account_name: &str) -> String {
    let headers = request.headers();
    let header = |name: &str| header_value(headers, name);

    // Zero-length bodies sign as an empty Content-Length
    let content_length = request
        .body()
        .and_then(|body| body.as_bytes())
        .map(|bytes| bytes.len())
        .filter(|len| *len > 0)
        .map(|len| len.to_string())
        .unwrap_or_default();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}{}",
        request.method().as_str(),
        header("content-encoding"),
        header("content-language"),
        content_length,
        header("content-md5"),
        header("content-type"),
        header("date"),
        header("if-modified-since"),
        header("if-match"),
        header("if-none-match"),
        header("if-unmodified-since"),
        header("range"),
        canonical_headers(headers),
        canonical_resource(request.url(), account_name),
    )
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// `x-ms-*` headers, lowercase and sorted, one `name:value\n` each
fn canonical_headers(headers: &HeaderMap) -> String {
    let mut ms_headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if !name.starts_with("x-ms-") {
            continue;
        }
        if let Ok(value) = value.to_str() {
            ms_headers.entry(name).or_default().push(value.trim());
        }
    }

    ms_headers
        .into_iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

/// `/{account}{path}` followed by `\nname:value` for each query parameter
fn canonical_resource(url: &Url, account_name: &str) -> String {
    let mut resource = format!("/{}{}", account_name, url.path());

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }

    for (name, mut values) in params {
        values.sort();
        resource.push('\n');
        resource.push_str(&name);
        resource.push(':');
        resource.push_str(&values.join(","));
    }

    resource
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use reqwest::{Client, Method};

    const ACCOUNT: &str = "devaccount";
    // base64("test-account-key")
    const ACCOUNT_KEY: &str = "dGVzdC1hY2NvdW50LWtleQ==";
    const DATE: &str = "Fri, 16 Oct 2026 09:30:00 GMT";

    fn create_directory_request() -> Request {
        Client::new()
            .request(
                Method::PUT,
                "https://devaccount.dfs.core.windows.net/raw-data/json?resource=directory",
            )
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("x-ms-date", DATE)
            .header("if-none-match", "*")
            .body(Vec::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_string_to_sign_for_directory_create() {
        let request = create_directory_request();

        let expected = "PUT\n\n\n\n\n\n\n\n\n*\n\n\n\
                        x-ms-date:Fri, 16 Oct 2026 09:30:00 GMT\n\
                        x-ms-version:2021-08-06\n\
                        /devaccount/raw-data/json\n\
                        resource:directory";
        assert_eq!(string_to_sign(&request, ACCOUNT), expected);
    }

    #[test]
    fn test_string_to_sign_counts_body_and_sorts_query() {
        let request = Client::new()
            .request(
                Method::PATCH,
                "https://devaccount.dfs.core.windows.net/raw-data/json/out.json?position=0&action=append",
            )
            .header("x-ms-date", DATE)
            .header("x-ms-version", STORAGE_API_VERSION)
            .body(b"{\"items\":[]}".to_vec())
            .build()
            .unwrap();

        let signed = string_to_sign(&request, ACCOUNT);
        assert!(signed.starts_with("PATCH\n\n\n12\n"));
        assert!(signed.ends_with("/devaccount/raw-data/json/out.json\naction:append\nposition:0"));
    }

    #[test]
    fn test_sign_matches_reference_hmac() {
        let credential = SharedKeyCredential::new(ACCOUNT, ACCOUNT_KEY).unwrap();
        let request = create_directory_request();

        assert_eq!(
            credential.sign(&string_to_sign(&request, ACCOUNT)),
            "+dGx9N5tpiGWzXadZ9cz1Cd9QQzoQI3HKWqbFlslDr8="
        );
    }

    #[test]
    fn test_authorize_sets_shared_key_header() {
        let credential = SharedKeyCredential::new(ACCOUNT, ACCOUNT_KEY).unwrap();
        let mut request = create_directory_request();
        credential.authorize(&mut request).unwrap();

        let header = request.headers()[AUTHORIZATION].to_str().unwrap();
        assert!(header.starts_with("SharedKey devaccount:"));
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(matches!(
            SharedKeyCredential::new(ACCOUNT, "not base64!"),
            Err(StorageError::InvalidAccountKey(_))
        ));
        assert!(matches!(
            SharedKeyCredential::new(ACCOUNT, ""),
            Err(StorageError::InvalidAccountKey(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let credential = SharedKeyCredential::new(ACCOUNT, ACCOUNT_KEY).unwrap();
        let rendered = format!("{:?}", credential);
        assert!(rendered.contains("devaccount"));
        assert!(!rendered.contains(ACCOUNT_KEY));
    }
}
