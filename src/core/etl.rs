use crate::core::ingest::IngestionLoop;
use crate::core::run_log::{RunLog, RunLogSink};
use crate::domain::model::{IngestSummary, StorageKey};
use crate::domain::ports::{Fetcher, ObjectStore};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub summary: IngestSummary,
    pub log_key: Option<StorageKey>,
}

/// One ingestion invocation: a fresh run log, one pass, one flush.
pub struct IngestEngine<S: ObjectStore, F: Fetcher> {
    ingestion: IngestionLoop<S, F>,
    sink: RunLogSink,
}

impl<S: ObjectStore, F: Fetcher> IngestEngine<S, F> {
    pub fn new(ingestion: IngestionLoop<S, F>, sink: RunLogSink) -> Self {
        Self { ingestion, sink }
    }

    pub async fn run(&self) -> IngestReport {
        let mut log = RunLog::new();
        log.info(format!(
            "Starting {} download - Start year: {}",
            self.ingestion.layout().file_stem,
            self.ingestion.key_space().start.0
        ));

        // Store faults come back in the summary and panics are caught here,
        // so the flush below runs on every path.
        let pass = AssertUnwindSafe(self.ingestion.run(&mut log)).catch_unwind().await;
        let summary = match pass {
            Ok(summary) => summary,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                log.error(format!("Unexpected error: {}", reason));
                let mut summary = IngestSummary::default();
                summary.abort(reason);
                summary
            }
        };

        let log_key = self.sink.flush(self.ingestion.store(), log).await;

        tracing::info!(
            "Ingestion finished: {} uploaded, {} skipped, {} not found, {} failed{}",
            summary.uploaded,
            summary.skipped,
            summary.not_found,
            summary.failed,
            if summary.aborted { " (aborted)" } else { "" }
        );

        IngestReport { summary, log_key }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic during ingestion".to_string()
    }
}
