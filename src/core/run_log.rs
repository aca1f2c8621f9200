use crate::domain::model::{LogLevel, LogRecord, StorageKey};
use crate::domain::ports::ObjectStore;
use chrono::{DateTime, Utc};

/// Append-only execution log for one ingestion run.
///
/// Records are mirrored to `tracing` as they are added. The log is handed
/// to [`RunLogSink::flush`] by value, so a run can persist it only once.
#[derive(Debug, Default)]
pub struct RunLog {
    records: Vec<LogRecord>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
        self.records.push(LogRecord {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.records.iter().filter(|r| r.level == level).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One record per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_string());
            out.push('\n');
        }
        out
    }
}

const MAX_KEY_SUFFIX: u32 = 100;

/// Persists a finished [`RunLog`] under a fresh, time-stamped key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogSink {
    log_prefix: String,
}

impl RunLogSink {
    pub fn new(log_prefix: impl Into<String>) -> Self {
        Self {
            log_prefix: log_prefix.into(),
        }
    }

    pub fn key_for(&self, at: DateTime<Utc>, suffix: u32) -> StorageKey {
        let stamp = at.format("%Y%m%d_%H%M%S");
        if suffix == 0 {
            StorageKey::new(format!("{}extract_log_{}.log", self.log_prefix, stamp))
        } else {
            StorageKey::new(format!(
                "{}extract_log_{}_{}.log",
                self.log_prefix, stamp, suffix
            ))
        }
    }

    /// Never fails: problems are reported on the process's own log output.
    /// Returns the key written, if any.
    pub async fn flush<S: ObjectStore>(&self, store: &S, log: RunLog) -> Option<StorageKey> {
        let key = self.fresh_key(store, Utc::now()).await;

        match store.put(&key, log.render().into_bytes()).await {
            Ok(()) => {
                tracing::info!(
                    "Log file uploaded to {} ({} records)",
                    store.uri(&key),
                    log.len()
                );
                Some(key)
            }
            Err(e) => {
                tracing::error!("Failed to upload run log to {}: {}", store.uri(&key), e);
                None
            }
        }
    }

    /// Nanosecond-stamped key used when the second-level keys cannot be
    /// confirmed free; it never matches a `key_for` key.
    pub fn fallback_key(&self, at: DateTime<Utc>) -> StorageKey {
        StorageKey::new(format!(
            "{}extract_log_{}.log",
            self.log_prefix,
            at.format("%Y%m%d_%H%M%S_%9f")
        ))
    }

    async fn fresh_key<S: ObjectStore>(&self, store: &S, at: DateTime<Utc>) -> StorageKey {
        for suffix in 0..MAX_KEY_SUFFIX {
            let candidate = self.key_for(at, suffix);
            match store.exists(&candidate).await {
                Ok(false) => return candidate,
                Ok(true) => continue,
                Err(e) => {
                    let fallback = self.fallback_key(at);
                    tracing::warn!(
                        "Could not check log key {}: {}; writing to {}",
                        candidate,
                        e,
                        fallback
                    );
                    return fallback;
                }
            }
        }

        let fallback = self.fallback_key(at);
        tracing::warn!(
            "{} log keys for {} already taken; writing to {}",
            MAX_KEY_SUFFIX,
            at.format("%Y%m%d_%H%M%S"),
            fallback
        );
        fallback
    }
}
