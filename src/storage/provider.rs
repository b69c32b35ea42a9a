use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;

/// Result of storing a blob
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Opaque key the store needs for later retrieval and deletion
    pub storage_key: String,
    /// Resolved address of the blob (URL for remote stores, path for local)
    pub location_url: String,
}

/// Blob store trait
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a payload under a freshly generated storage key.
    /// Returns the key and the store's resolved address for the blob.
    async fn put(&self, data: Bytes, original_name: &str, content_type: &str)
        -> Result<StoredBlob>;

    /// Fetch a blob and the content type the store recorded for it,
    /// defaulting to application/octet-stream when the store has none.
    async fn get(&self, storage_key: &str) -> Result<(Bytes, String)>;

    /// Best-effort delete. Failures are logged and swallowed so that
    /// absence of the blob never blocks removal of its metadata record.
    async fn delete(&self, storage_key: &str);

    /// Get the store type name
    fn store_type(&self) -> &'static str;
}

/// Generate a storage key for an upload: a random UUID prefix joined to the
/// sanitized original name. Keys are unique even for identical filenames.
pub fn make_storage_key(original_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name))
}

/// Strip path separators, quotes and control bytes from a client-supplied
/// filename so storage keys are never path-traversal vectors.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | '\'' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}
