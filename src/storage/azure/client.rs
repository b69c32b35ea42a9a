//! Thin REST client for blob-level operations against one container.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::collections::BTreeMap;

use crate::error::{AppError, Result};

use super::signer::{ms_date_now, Signer};

const MS_VERSION: &str = "2021-08-06";

/// Response from a blob request
#[derive(Debug)]
pub struct BlobResponse {
    pub status: u16,
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Blob-level client bound to one storage account and container
#[derive(Clone, Debug)]
pub struct Client {
    account: String,
    key: Vec<u8>,
    container: String,
    endpoint: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(
        account: impl Into<String>,
        access_key_base64: &str,
        container: impl Into<String>,
        endpoint: Option<String>,
    ) -> Result<Self> {
        let account = account.into();
        let key = BASE64.decode(access_key_base64.trim()).map_err(|e| {
            AppError::StoreUnavailable(format!("Invalid Azure access key: {}", e))
        })?;
        let endpoint = endpoint
            .unwrap_or_else(|| format!("https://{}.blob.core.windows.net", account))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            account,
            key,
            container: container.into(),
            endpoint,
            http: reqwest::Client::new(),
        })
    }

    /// Full URL for a blob, with the key percent-encoded
    pub fn blob_url(&self, storage_key: &str) -> String {
        format!("{}{}", self.endpoint, self.blob_path(storage_key))
    }

    /// Encoded URL path for a blob: /{container}/{key}
    pub fn blob_path(&self, storage_key: &str) -> String {
        format!(
            "/{}/{}",
            self.container,
            urlencoding::encode(storage_key)
        )
    }

    fn signed_headers(
        &self,
        verb: &str,
        storage_key: &str,
        content_type: &str,
        extra_ms: &[(&str, &str)],
    ) -> HeaderMap {
        let mut ms_headers: BTreeMap<String, String> = BTreeMap::new();
        ms_headers.insert("x-ms-date".to_string(), ms_date_now());
        ms_headers.insert("x-ms-version".to_string(), MS_VERSION.to_string());
        for (k, v) in extra_ms {
            ms_headers.insert((*k).to_string(), (*v).to_string());
        }

        let resource = format!("/{}{}", self.account, self.blob_path(storage_key));
        let auth = Signer::new(verb, content_type, &ms_headers, &resource)
            .authorization(&self.account, &self.key);

        let mut headers = HeaderMap::new();
        for (k, v) in &ms_headers {
            if let (Ok(name), Ok(value)) =
                (HeaderName::try_from(k.as_str()), HeaderValue::from_str(v))
            {
                headers.insert(name, value);
            }
        }
        if !content_type.is_empty() {
            if let Ok(value) = HeaderValue::from_str(content_type) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
        if let Ok(value) = HeaderValue::from_str(&auth) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn collect(resp: reqwest::Response) -> Result<BlobResponse> {
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp
            .bytes()
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to read response: {}", e)))?;

        Ok(BlobResponse {
            status,
            body,
            content_type,
        })
    }

    fn connect_error(e: reqwest::Error) -> AppError {
        if e.is_connect() || e.is_timeout() {
            AppError::StoreUnavailable(format!("Blob store unreachable: {}", e))
        } else {
            AppError::StoreUnavailable(format!("Blob request failed: {}", e))
        }
    }

    /// PUT a block blob
    pub async fn put_blob(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<BlobResponse> {
        let headers = self.signed_headers(
            "put",
            storage_key,
            content_type,
            &[("x-ms-blob-type", "BlockBlob")],
        );

        let resp = self
            .http
            .put(self.blob_url(storage_key))
            .headers(headers)
            .body(data)
            .send()
            .await
            .map_err(Self::connect_error)?;

        Self::collect(resp).await
    }

    /// GET a blob
    pub async fn get_blob(&self, storage_key: &str) -> Result<BlobResponse> {
        let headers = self.signed_headers("get", storage_key, "", &[]);

        let resp = self
            .http
            .get(self.blob_url(storage_key))
            .headers(headers)
            .send()
            .await
            .map_err(Self::connect_error)?;

        Self::collect(resp).await
    }

    /// DELETE a blob
    pub async fn delete_blob(&self, storage_key: &str) -> Result<BlobResponse> {
        let headers = self.signed_headers("delete", storage_key, "", &[]);

        let resp = self
            .http
            .delete(self.blob_url(storage_key))
            .headers(headers)
            .send()
            .await
            .map_err(Self::connect_error)?;

        Self::collect(resp).await
    }
}
