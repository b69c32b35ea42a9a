use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::LocalStoreConfig;
use crate::error::{AppError, Result};
use crate::storage::{make_storage_key, BlobStore, StoredBlob};

/// Local file system blob store
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(config: LocalStoreConfig) -> Self {
        Self {
            base_path: PathBuf::from(config.base_path),
        }
    }

    fn blob_path(&self, storage_key: &str) -> PathBuf {
        self.base_path.join(storage_key)
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn put(
        &self,
        data: Bytes,
        original_name: &str,
        _content_type: &str,
    ) -> Result<StoredBlob> {
        let storage_key = make_storage_key(original_name);
        let full_path = self.blob_path(&storage_key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::StoreUnavailable(format!("Storage directory unavailable: {}", e))
            })?;
        }

        let mut file = fs::File::create(&full_path)
            .await
            .map_err(|e| AppError::WriteFailed(format!("Failed to create blob file: {}", e)))?;
        file.write_all(&data)
            .await
            .map_err(|e| AppError::WriteFailed(format!("Failed to write blob: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::WriteFailed(format!("Failed to flush blob: {}", e)))?;

        tracing::debug!("Saved blob to {:?}", full_path);

        Ok(StoredBlob {
            location_url: full_path.to_string_lossy().into_owned(),
            storage_key,
        })
    }

    async fn get(&self, storage_key: &str) -> Result<(Bytes, String)> {
        let full_path = self.blob_path(storage_key);

        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Blob not found: {}", storage_key))
            } else {
                AppError::StoreUnavailable(format!("Failed to read blob: {}", e))
            }
        })?;

        // The filesystem records no content type; guess from the key
        let content_type = mime_guess::from_path(storage_key)
            .first_or_octet_stream()
            .to_string();

        Ok((Bytes::from(data), content_type))
    }

    async fn delete(&self, storage_key: &str) {
        let full_path = self.blob_path(storage_key);

        match fs::remove_file(&full_path).await {
            Ok(()) => tracing::debug!("Deleted blob {:?}", full_path),
            Err(e) => {
                tracing::warn!("Best-effort blob delete failed for {:?}: {}", full_path, e)
            }
        }
    }

    fn store_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(LocalStoreConfig {
            base_path: dir.path().to_string_lossy().into_owned(),
        })
    }

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let stored = store
            .put(Bytes::from_static(b"hello blob"), "note.txt", "text/plain")
            .await
            .unwrap();
        assert!(stored.storage_key.ends_with("note.txt"));
        assert!(stored.location_url.contains(&stored.storage_key));

        let (data, content_type) = store.get(&stored.storage_key).await.unwrap();
        assert_eq!(&data[..], b"hello blob");
        assert_eq!(content_type, "text/plain");
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let err = store.get("no-such-key.bin").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_of_missing_blob_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        // Must not panic or propagate anything
        store.delete("already-gone.pdf").await;
    }

    #[tokio::test]
    async fn unknown_extension_defaults_to_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let stored = store
            .put(Bytes::from_static(b"\x00\x01"), "blob.weirdext", "")
            .await
            .unwrap();
        let (_, content_type) = store.get(&stored.storage_key).await.unwrap();
        assert_eq!(content_type, "application/octet-stream");
    }
}
