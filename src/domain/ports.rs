use crate::domain::model::{FetchOutcome, StorageKey};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Durable object store: the existence oracle and the uploader.
pub trait ObjectStore: Send + Sync {
    /// Reflects the store at call time; implementations must not cache.
    fn exists(&self, key: &StorageKey) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Unconditional write, last write wins.
    fn put(
        &self,
        key: &StorageKey,
        data: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Display location of a key, used in run log messages.
    fn uri(&self, key: &StorageKey) -> String;
}

pub trait Fetcher: Send + Sync {
    /// Exactly one attempt; never retries.
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl std::future::Future<Output = FetchOutcome> + Send;
}

/// One opaque unit of work in the pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<()>;
}
