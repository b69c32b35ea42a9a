use async_trait::async_trait;
use bytes::Bytes;

use crate::config::AzureStoreConfig;
use crate::error::{AppError, Result};
use crate::storage::{make_storage_key, BlobStore, StoredBlob};

use super::client::Client;

/// Azure Blob storage backend
pub struct AzureStore {
    client: Client,
}

impl AzureStore {
    pub fn new(config: AzureStoreConfig) -> Result<Self> {
        let client = Client::new(
            config.account,
            &config.access_key,
            config.container,
            config.endpoint,
        )?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BlobStore for AzureStore {
    async fn put(
        &self,
        data: Bytes,
        original_name: &str,
        content_type: &str,
    ) -> Result<StoredBlob> {
        let storage_key = make_storage_key(original_name);

        let resp = self.client.put_blob(&storage_key, data, content_type).await?;
        if !(200..300).contains(&resp.status) {
            return Err(AppError::WriteFailed(format!(
                "Blob upload rejected with status {}",
                resp.status
            )));
        }

        tracing::info!("Uploaded blob {}", storage_key);

        Ok(StoredBlob {
            location_url: self.client.blob_url(&storage_key),
            storage_key,
        })
    }

    async fn get(&self, storage_key: &str) -> Result<(Bytes, String)> {
        let resp = self.client.get_blob(storage_key).await?;

        if resp.status == 404 {
            return Err(AppError::NotFound(format!(
                "Blob not found: {}",
                storage_key
            )));
        }
        if !(200..300).contains(&resp.status) {
            return Err(AppError::StoreUnavailable(format!(
                "Blob download failed with status {}",
                resp.status
            )));
        }

        let content_type = resp
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok((resp.body, content_type))
    }

    async fn delete(&self, storage_key: &str) {
        match self.client.delete_blob(storage_key).await {
            Ok(resp) if (200..300).contains(&resp.status) || resp.status == 404 => {
                tracing::debug!("Deleted blob {}", storage_key);
            }
            Ok(resp) => {
                tracing::warn!(
                    "Best-effort blob delete failed for {}: status {}",
                    storage_key,
                    resp.status
                );
            }
            Err(e) => {
                tracing::warn!("Best-effort blob delete failed for {}: {}", storage_key, e);
            }
        }
    }

    fn store_type(&self) -> &'static str {
        "azure"
    }
}
