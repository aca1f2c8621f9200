use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Storage error at {key}: {message}")]
    StorageError { key: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Command `{command}` failed: {message}")]
    CommandError { command: String, message: String },

    #[error("Ingestion aborted: {reason}")]
    IngestAborted { reason: String },

    #[error("Stage {stage} failed after {attempts} attempt(s): {message}")]
    StageError {
        stage: String,
        attempts: u32,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn storage(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::StorageError {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::HttpError(_) => ErrorSeverity::Medium,
            EtlError::StageError { .. } | EtlError::CommandError { .. } => ErrorSeverity::High,
            EtlError::IngestAborted { .. } => ErrorSeverity::Critical,
            EtlError::StorageError { .. } | EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::TomlError(_)
            | EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::HttpError(_) => "Check network connectivity to the remote source and retry",
            EtlError::IoError(_) => "Check that the local storage path exists and is writable",
            EtlError::SerializationError(_) => "Report this as a bug; run records failed to serialize",
            EtlError::TomlError(_) => "Fix the syntax of the pipeline configuration file",
            EtlError::StorageError { .. } => {
                "Check bucket permissions and credentials for the object store"
            }
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review command line flags, environment variables and the pipeline file"
            }
            EtlError::CommandError { .. } => "Run the stage command by hand and check its output",
            EtlError::IngestAborted { .. } => {
                "Check object store connectivity; the run log lists what was processed"
            }
            EtlError::StageError { .. } => {
                "Inspect the failed stage's output and re-trigger the pipeline"
            }
        }
    }

    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = EtlError::storage("dataset/trips/a.parquet", "access denied");
        assert_eq!(
            err.to_string(),
            "Storage error at dataset/trips/a.parquet: access denied"
        );
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_stage_error_severity() {
        let err = EtlError::StageError {
            stage: "load".to_string(),
            attempts: 3,
            message: "exit status 1".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("after 3 attempt(s)"));
    }
}
