pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
#[cfg(feature = "s3")]
pub use crate::config::s3::S3Storage;
pub use crate::config::store::StoreBackend;
pub use crate::config::toml_config::PipelineFile;
pub use crate::config::IngestConfig;

pub use crate::core::{
    etl::{IngestEngine, IngestReport},
    fetcher::HttpFetcher,
    ingest::{IngestSettings, IngestionLoop},
    keyspace::{KeySpace, SourceLayout},
    orchestrator::{Gate, PipelineOrchestrator, PipelineOutcome, RetryPolicy},
    run_log::{RunLog, RunLogSink},
    stages::{CommandStage, IngestStage},
};
pub use crate::domain::model::{FetchOutcome, LogLevel, PipelineState, StorageKey};
pub use crate::domain::ports::{Fetcher, ObjectStore, Stage};
pub use crate::utils::error::{EtlError, Result};
