//! Azure Blob storage backend: request signing, a thin REST client and the
//! BlobStore implementation on top of them.

pub mod client;
pub mod provider;
pub mod signer;

pub use provider::AzureStore;
