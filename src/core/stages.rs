use crate::core::etl::IngestEngine;
use crate::domain::ports::{Fetcher, ObjectStore, Stage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Runs the ingestion engine in-process. Only a pass that aborted on a
/// store fault counts as a failed attempt.
pub struct IngestStage<S: ObjectStore, F: Fetcher> {
    name: String,
    engine: IngestEngine<S, F>,
}

impl<S: ObjectStore, F: Fetcher> IngestStage<S, F> {
    pub fn new(name: impl Into<String>, engine: IngestEngine<S, F>) -> Self {
        Self {
            name: name.into(),
            engine,
        }
    }
}

#[async_trait]
impl<S: ObjectStore, F: Fetcher> Stage for IngestStage<S, F> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<()> {
        let report = self.engine.run().await;
        match report.summary.abort_reason {
            Some(reason) if report.summary.aborted => Err(EtlError::IngestAborted { reason }),
            _ => Ok(()),
        }
    }
}

/// External program; success is a zero exit status.
#[derive(Debug, Clone)]
pub struct CommandStage {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandStage {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!("Spawning `{}`", self.command_line());
        let status = command.status().await.map_err(|e| EtlError::CommandError {
            command: self.command_line(),
            message: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(EtlError::CommandError {
                command: self.command_line(),
                message: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::etl::IngestEngine;
    use crate::core::ingest::{IngestSettings, IngestionLoop};
    use crate::core::keyspace::KeySpace;
    use crate::core::run_log::RunLogSink;
    use crate::core::test_support::*;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn ingest_stage(store: RecordingStore) -> IngestStage<RecordingStore, ScriptedFetcher> {
        let ingestion = IngestionLoop::new(
            store,
            ScriptedFetcher::new(),
            layout(),
            KeySpace::new((2023, 1), (2023, 2)),
            IngestSettings {
                request_timeout: Duration::from_secs(1),
                throttle: Duration::ZERO,
            },
        );
        IngestStage::new(
            "download_taxi_data",
            IngestEngine::new(ingestion, RunLogSink::new("logs/")),
        )
    }

    #[tokio::test]
    async fn test_ingest_stage_with_item_failures_succeeds() {
        let store = RecordingStore::new();
        assert_ok!(ingest_stage(store.clone()).run().await);
        assert_eq!(store.puts_under("logs/").len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_stage_fails_on_abort() {
        let store = RecordingStore::new().fail_exists_at(data_key(2023, 2));
        let err = assert_err!(ingest_stage(store.clone()).run().await);
        assert!(matches!(err, EtlError::IngestAborted { .. }));
        assert_eq!(store.puts_under("logs/").len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_stage_exit_status() {
        let ok = CommandStage::new("ok", "sh", vec!["-c".to_string(), "exit 0".to_string()]);
        assert_ok!(ok.run().await);

        let failing =
            CommandStage::new("bad", "sh", vec!["-c".to_string(), "exit 3".to_string()]);
        let err = assert_err!(failing.run().await);
        assert!(err.to_string().contains("sh -c exit 3"));
    }

    #[tokio::test]
    async fn test_command_stage_missing_program() {
        let stage = CommandStage::new("missing", "trip-etl-no-such-program", vec![]);
        assert_err!(stage.run().await);
    }
}
