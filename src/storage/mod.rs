pub mod provider;
pub mod local;
pub mod azure;

pub use provider::*;
pub use local::*;
pub use azure::AzureStore;

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Build the blob store selected by configuration
pub fn store_from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalStore::new(config.local.clone()))),
        "azure" => {
            let azure = &config.azure;
            if azure.account.is_empty() || azure.access_key.is_empty() || azure.container.is_empty()
            {
                return Err(AppError::StoreUnavailable(
                    "Azure storage requires account, access_key and container".to_string(),
                ));
            }
            Ok(Arc::new(AzureStore::new(azure.clone())?))
        }
        other => Err(AppError::StoreUnavailable(format!(
            "Unknown storage provider: {}",
            other
        ))),
    }
}
