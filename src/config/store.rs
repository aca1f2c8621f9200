use crate::config::cli::LocalStorage;
#[cfg(feature = "s3")]
use crate::config::s3::S3Storage;
use crate::config::IngestConfig;
use crate::core::{ObjectStore, StorageKey};
use crate::utils::error::Result;

/// The store selected at startup.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Local(LocalStorage),
    #[cfg(feature = "s3")]
    S3(S3Storage),
}

impl StoreBackend {
    pub async fn from_config(config: &IngestConfig) -> Result<Self> {
        if let Some(root) = &config.local_root {
            tracing::info!("Using local object store at {}", root.display());
            return Ok(StoreBackend::Local(LocalStorage::new(root.clone())));
        }

        remote_store(config).await
    }
}

#[cfg(feature = "s3")]
async fn remote_store(config: &IngestConfig) -> Result<StoreBackend> {
    Ok(StoreBackend::S3(S3Storage::connect(config).await?))
}

#[cfg(not(feature = "s3"))]
async fn remote_store(_config: &IngestConfig) -> Result<StoreBackend> {
    Err(crate::utils::error::EtlError::ConfigError {
        message: "Built without S3 support; pass --local-root".to_string(),
    })
}

impl ObjectStore for StoreBackend {
    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        match self {
            StoreBackend::Local(store) => store.exists(key).await,
            #[cfg(feature = "s3")]
            StoreBackend::S3(store) => store.exists(key).await,
        }
    }

    async fn put(&self, key: &StorageKey, data: Vec<u8>) -> Result<()> {
        match self {
            StoreBackend::Local(store) => store.put(key, data).await,
            #[cfg(feature = "s3")]
            StoreBackend::S3(store) => store.put(key, data).await,
        }
    }

    fn uri(&self, key: &StorageKey) -> String {
        match self {
            StoreBackend::Local(store) => store.uri(key),
            #[cfg(feature = "s3")]
            StoreBackend::S3(store) => store.uri(key),
        }
    }
}
