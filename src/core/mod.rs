pub mod etl;
pub mod fetcher;
pub mod ingest;
pub mod keyspace;
pub mod orchestrator;
pub mod run_log;
pub mod stages;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{FetchOutcome, IngestSummary, ItemOutcome, SourceKey, StorageKey};
pub use crate::domain::ports::{Fetcher, ObjectStore, Stage};
pub use crate::utils::error::Result;
