use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Path of an object inside the durable store, relative to the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One expected monthly source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey {
    pub year: i32,
    pub month: u32,
    pub file_name: String,
    pub url: String,
    pub storage_key: StorageKey,
}

/// Result of a single remote fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(Vec<u8>),
    NotFound,
    HttpError(u16),
    TransportError(String),
}

/// What happened to one source file during an ingestion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already present in the store; nothing fetched.
    Skipped,
    Uploaded { bytes: usize },
    NotFound,
    FetchFailed { reason: String },
    UploadFailed { reason: String },
}

impl ItemOutcome {
    /// Whether the remote source was contacted for this item.
    pub fn touched_remote(&self) -> bool {
        !matches!(self, ItemOutcome::Skipped)
    }
}

/// Counters for one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub skipped: usize,
    pub uploaded: usize,
    pub not_found: usize,
    pub failed: usize,
    pub aborted: bool,
    pub abort_reason: Option<String>,
}

impl IngestSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Uploaded { .. } => self.uploaded += 1,
            ItemOutcome::NotFound => self.not_found += 1,
            ItemOutcome::FetchFailed { .. } | ItemOutcome::UploadFailed { .. } => self.failed += 1,
        }
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = true;
        self.abort_reason = Some(reason.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level,
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed { error: String },
}

/// Terminal result of one stage after its retry budget.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: String,
    pub attempts: u32,
    pub outcome: StageOutcome,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl StageReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == StageOutcome::Succeeded
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    WaitingForGate,
    Running { stage: String },
    Done,
    Failed { stage: String },
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::WaitingForGate => f.write_str("WAITING_FOR_GATE"),
            PipelineState::Running { stage } => write!(f, "RUNNING({})", stage),
            PipelineState::Done => f.write_str("DONE"),
            PipelineState::Failed { stage } => write!(f, "FAILED({})", stage),
        }
    }
}
