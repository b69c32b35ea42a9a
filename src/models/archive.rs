use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Archive model - one row per stored file
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Archive {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    /// Opaque key identifying the blob in the store; never user-supplied
    pub storage_key: String,
    /// Store-resolved address of the blob
    pub location_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Metadata supplied alongside an upload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArchiveRequest {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
}

/// An uploaded payload as extracted from the multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: bytes::Bytes,
    pub file_name: String,
    pub content_type: String,
}
