pub mod cli;
#[cfg(feature = "s3")]
pub mod s3;
pub mod store;
pub mod toml_config;

use crate::core::etl::IngestEngine;
use crate::core::ingest::{IngestSettings, IngestionLoop};
use crate::core::keyspace::{KeySpace, SourceLayout};
use crate::core::run_log::RunLogSink;
use crate::domain::ports::{Fetcher, ObjectStore};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";
pub const DEFAULT_FILE_STEM: &str = "yellow_tripdata";
pub const DEFAULT_EXTENSION: &str = "parquet";
pub const DEFAULT_DATA_PREFIX: &str = "dataset/trips/";
pub const DEFAULT_LOG_PREFIX: &str = "from-git/logs/";
pub const DEFAULT_START_YEAR: i32 = 2023;

/// Settings for one ingestion run, from flags, environment or the `[ingest]`
/// table of a pipeline file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[serde(default)]
pub struct IngestConfig {
    /// Target bucket (default: `<project-id>-data-bucket`)
    #[cfg_attr(feature = "cli", arg(long, env = "TRIP_ETL_BUCKET"))]
    pub bucket: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, env = "GOOGLE_CLOUD_PROJECT"))]
    pub project_id: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, env = "TRIP_ETL_BASE_URL", default_value = DEFAULT_BASE_URL))]
    pub base_url: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_FILE_STEM))]
    pub file_stem: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_EXTENSION))]
    pub extension: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_DATA_PREFIX))]
    pub data_prefix: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_LOG_PREFIX))]
    pub log_prefix: String,

    #[cfg_attr(feature = "cli", arg(long, env = "TRIP_ETL_START_YEAR", default_value_t = DEFAULT_START_YEAR))]
    pub start_year: i32,

    /// Last year to ingest (default: current UTC year)
    #[cfg_attr(feature = "cli", arg(long))]
    pub end_year: Option<i32>,

    /// Last month of the last year (default: 12)
    #[cfg_attr(feature = "cli", arg(long))]
    pub end_month: Option<u32>,

    #[cfg_attr(feature = "cli", arg(long, default_value_t = 60))]
    pub request_timeout_secs: u64,

    /// Pause after each remote request
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 1000))]
    pub throttle_ms: u64,

    /// Use a local directory as the object store instead of S3
    #[cfg_attr(feature = "cli", arg(long, env = "TRIP_ETL_LOCAL_ROOT"))]
    pub local_root: Option<PathBuf>,

    /// Custom S3-compatible endpoint
    #[cfg_attr(feature = "cli", arg(long, env = "TRIP_ETL_ENDPOINT_URL"))]
    pub endpoint_url: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, env = "AWS_REGION"))]
    pub region: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            project_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            file_stem: DEFAULT_FILE_STEM.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            data_prefix: DEFAULT_DATA_PREFIX.to_string(),
            log_prefix: DEFAULT_LOG_PREFIX.to_string(),
            start_year: DEFAULT_START_YEAR,
            end_year: None,
            end_month: None,
            request_timeout_secs: 60,
            throttle_ms: 1000,
            local_root: None,
            endpoint_url: None,
            region: None,
        }
    }
}

impl IngestConfig {
    pub fn bucket_name(&self) -> Result<String> {
        if let Some(bucket) = &self.bucket {
            return Ok(bucket.clone());
        }
        match &self.project_id {
            Some(project) => Ok(format!("{}-data-bucket", project)),
            None => Err(EtlError::MissingConfigError {
                field: "bucket (or project_id)".to_string(),
            }),
        }
    }

    pub fn layout(&self) -> SourceLayout {
        SourceLayout {
            base_url: self.base_url.clone(),
            file_stem: self.file_stem.clone(),
            extension: self.extension.clone(),
            data_prefix: self.data_prefix.clone(),
        }
    }

    pub fn key_space(&self) -> KeySpace {
        let end_year = self.end_year.unwrap_or_else(|| Utc::now().year());
        KeySpace::new(
            (self.start_year, 1),
            (end_year, self.end_month.unwrap_or(12)),
        )
    }

    pub fn settings(&self) -> IngestSettings {
        IngestSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            throttle: Duration::from_millis(self.throttle_ms),
        }
    }

    pub fn sink(&self) -> RunLogSink {
        RunLogSink::new(self.log_prefix.clone())
    }

    pub fn engine<S: ObjectStore, F: Fetcher>(&self, store: S, fetcher: F) -> IngestEngine<S, F> {
        let ingestion = IngestionLoop::new(
            store,
            fetcher,
            self.layout(),
            self.key_space(),
            self.settings(),
        );
        IngestEngine::new(ingestion, self.sink())
    }
}

impl Validate for IngestConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_non_empty_string("file_stem", &self.file_stem)?;
        validation::validate_non_empty_string("extension", &self.extension)?;
        validation::validate_key_prefix("data_prefix", &self.data_prefix)?;
        validation::validate_key_prefix("log_prefix", &self.log_prefix)?;

        if self.data_prefix == self.log_prefix {
            return Err(EtlError::InvalidConfigValueError {
                field: "log_prefix".to_string(),
                value: self.log_prefix.clone(),
                reason: "Log prefix must differ from the data prefix".to_string(),
            });
        }

        let current_year = Utc::now().year();
        validation::validate_range("start_year", self.start_year, 2009, current_year)?;
        if let Some(end_year) = self.end_year {
            validation::validate_range("end_year", end_year, self.start_year, current_year + 1)?;
        }
        if let Some(end_month) = self.end_month {
            validation::validate_range("end_month", end_month, 1, 12)?;
        }
        validation::validate_positive_number("request_timeout_secs", self.request_timeout_secs, 1)?;

        if self.local_root.is_none() {
            validation::validate_bucket_name("bucket", &self.bucket_name()?)?;
            if let Some(endpoint) = &self.endpoint_url {
                validation::validate_url("endpoint_url", endpoint)?;
            }
        }

        tracing::debug!("✅ Ingest configuration validation passed");
        Ok(())
    }
}
