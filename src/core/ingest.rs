use crate::core::keyspace::{KeySpace, SourceLayout};
use crate::core::run_log::RunLog;
use crate::domain::model::{FetchOutcome, IngestSummary, ItemOutcome, SourceKey};
use crate::domain::ports::{Fetcher, ObjectStore};
use crate::utils::error::Result;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    pub request_timeout: Duration,
    /// Fixed pause after every item that hit the remote source.
    pub throttle: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            throttle: Duration::from_secs(1),
        }
    }
}

/// Walks the key space once, uploading every file the store does not have yet.
pub struct IngestionLoop<S: ObjectStore, F: Fetcher> {
    store: S,
    fetcher: F,
    layout: SourceLayout,
    key_space: KeySpace,
    settings: IngestSettings,
}

impl<S: ObjectStore, F: Fetcher> IngestionLoop<S, F> {
    pub fn new(
        store: S,
        fetcher: F,
        layout: SourceLayout,
        key_space: KeySpace,
        settings: IngestSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            layout,
            key_space,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    pub fn key_space(&self) -> KeySpace {
        self.key_space
    }

    /// Runs the pass. Per-item failures are logged and skipped over; a store
    /// fault ends the pass early and is reported in the summary, never returned.
    pub async fn run(&self, log: &mut RunLog) -> IngestSummary {
        let mut summary = IngestSummary::default();

        match self.run_items(log, &mut summary).await {
            Ok(()) => log.info("Download process completed successfully."),
            Err(e) => {
                log.error(format!("Unexpected error: {}", e));
                summary.abort(e.to_string());
            }
        }

        summary
    }

    async fn run_items(&self, log: &mut RunLog, summary: &mut IngestSummary) -> Result<()> {
        for (year, month) in self.key_space.iter() {
            let source = self.layout.source_key(year, month);
            let outcome = self.process(&source, log).await?;
            summary.record(&outcome);

            if outcome.touched_remote() && !self.settings.throttle.is_zero() {
                tokio::time::sleep(self.settings.throttle).await;
            }
        }
        Ok(())
    }

    /// `Err` only for faults that should end the whole pass.
    async fn process(&self, source: &SourceKey, log: &mut RunLog) -> Result<ItemOutcome> {
        let file_name = &source.file_name;

        if self.store.exists(&source.storage_key).await? {
            log.info(format!("{} already exists in storage. Skipping.", file_name));
            return Ok(ItemOutcome::Skipped);
        }

        log.info(format!("Downloading {}...", file_name));

        let outcome = match self
            .fetcher
            .fetch(&source.url, self.settings.request_timeout)
            .await
        {
            FetchOutcome::Success(payload) => {
                let bytes = payload.len();
                match self.store.put(&source.storage_key, payload).await {
                    Ok(()) => {
                        log.info(format!(
                            "Uploaded file to {}",
                            self.store.uri(&source.storage_key)
                        ));
                        ItemOutcome::Uploaded { bytes }
                    }
                    Err(e) => {
                        log.error(format!("Failed to upload {}: {}", file_name, e));
                        ItemOutcome::UploadFailed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            FetchOutcome::NotFound => {
                log.warn(format!("{} not found on source. Skipping.", file_name));
                ItemOutcome::NotFound
            }
            FetchOutcome::HttpError(status) => {
                log.error(format!(
                    "Failed to download {}. HTTP {}",
                    file_name, status
                ));
                ItemOutcome::FetchFailed {
                    reason: format!("HTTP {}", status),
                }
            }
            FetchOutcome::TransportError(reason) => {
                log.error(format!(
                    "HTTP error while downloading {}: {}",
                    file_name, reason
                ));
                ItemOutcome::FetchFailed { reason }
            }
        };

        Ok(outcome)
    }
}
