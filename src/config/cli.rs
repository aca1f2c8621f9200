use crate::core::{ObjectStore, StorageKey};
use crate::utils::error::{EtlError, Result};
use std::path::PathBuf;

/// Object store backed by a local directory; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, key: &StorageKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }
}

impl ObjectStore for LocalStorage {
    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        tokio::fs::try_exists(self.full_path(key))
            .await
            .map_err(|e| EtlError::storage(key.as_str(), e))
    }

    async fn put(&self, key: &StorageKey, data: Vec<u8>) -> Result<()> {
        let full_path = self.full_path(key);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| EtlError::storage(key.as_str(), e))
    }

    fn uri(&self, key: &StorageKey) -> String {
        format!("file://{}", self.full_path(key).display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_exists() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = StorageKey::new("dataset/trips/yellow_tripdata_2023-01.parquet");

        assert!(!storage.exists(&key).await.unwrap());
        storage.put(&key, b"PAR1".to_vec()).await.unwrap();
        assert!(storage.exists(&key).await.unwrap());

        let on_disk = std::fs::read(dir.path().join(key.as_str())).unwrap();
        assert_eq!(on_disk, b"PAR1");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = StorageKey::new("a.bin");

        storage.put(&key, b"one".to_vec()).await.unwrap();
        storage.put(&key, b"two".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("a.bin")).unwrap(), b"two");
    }

    #[test]
    fn test_uri() {
        let storage = LocalStorage::new("/data");
        assert_eq!(
            storage.uri(&StorageKey::new("logs/x.log")),
            "file:///data/logs/x.log"
        );
    }
}
