//! In-memory doubles shared by the unit tests.

use crate::core::keyspace::SourceLayout;
use crate::domain::model::{FetchOutcome, StorageKey};
use crate::domain::ports::{Fetcher, ObjectStore};
use crate::utils::error::{EtlError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://example.test/trip-data";

pub fn layout() -> SourceLayout {
    SourceLayout {
        base_url: BASE_URL.to_string(),
        file_stem: "yellow_tripdata".to_string(),
        extension: "parquet".to_string(),
        data_prefix: "dataset/trips/".to_string(),
    }
}

pub fn data_key(year: i32, month: u32) -> StorageKey {
    layout().source_key(year, month).storage_key
}

pub fn url(year: i32, month: u32) -> String {
    layout().source_key(year, month).url
}

#[derive(Default)]
struct StoreState {
    objects: BTreeMap<StorageKey, Vec<u8>>,
    puts: Vec<StorageKey>,
    fail_exists: HashSet<StorageKey>,
    fail_puts: HashSet<StorageKey>,
}

#[derive(Clone, Default)]
pub struct RecordingStore {
    state: Arc<Mutex<StoreState>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, key: StorageKey, data: &[u8]) -> Self {
        self.state.lock().unwrap().objects.insert(key, data.to_vec());
        self
    }

    pub fn fail_exists_at(self, key: StorageKey) -> Self {
        self.state.lock().unwrap().fail_exists.insert(key);
        self
    }

    pub fn fail_put_at(self, key: StorageKey) -> Self {
        self.state.lock().unwrap().fail_puts.insert(key);
        self
    }

    pub fn puts(&self) -> Vec<StorageKey> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn puts_under(&self, prefix: &str) -> Vec<StorageKey> {
        self.puts()
            .into_iter()
            .filter(|k| k.as_str().starts_with(prefix))
            .collect()
    }

    pub fn object(&self, key: &StorageKey) -> Option<Vec<u8>> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }
}

impl ObjectStore for RecordingStore {
    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if state.fail_exists.contains(key) {
            return Err(EtlError::storage(key.as_str(), "connection reset"));
        }
        Ok(state.objects.contains_key(key))
    }

    async fn put(&self, key: &StorageKey, data: Vec<u8>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.puts.push(key.clone());
        if state.fail_puts.contains(key) {
            return Err(EtlError::storage(key.as_str(), "permission denied"));
        }
        state.objects.insert(key.clone(), data);
        Ok(())
    }

    fn uri(&self, key: &StorageKey) -> String {
        format!("mem://test-bucket/{}", key)
    }
}

/// Answers from a fixed table; unknown URLs are 404.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    outcomes: HashMap<String, FetchOutcome>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: String, outcome: FetchOutcome) -> Self {
        self.outcomes.insert(url, outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        self.calls.lock().unwrap().push(url.to_string());
        self.outcomes
            .get(url)
            .cloned()
            .unwrap_or(FetchOutcome::NotFound)
    }
}
