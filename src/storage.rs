//! Durable key-value persistence for the client stores.
//!
//! Each store serializes its whole state as one JSON document under a fixed
//! key. Writes are synchronous and last-write-wins.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const MESSAGES_STORAGE_KEY: &str = "estate-messages";
pub const SEARCH_STORAGE_KEY: &str = "estate-search";

/// Persistence backend injected into the stores
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn save(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key under a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!("Persisted {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// In-process store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Load and decode a JSON entry. Missing, unreadable or corrupt entries
/// yield `None` so the caller starts from empty state.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let text = match store.load(key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read persisted state {}: {:#}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding corrupt persisted state {}: {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON entry; failures are logged, never propagated,
/// because the in-memory state stays authoritative.
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not serialize state {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = store.save(key, &text) {
        warn!("Could not persist state {}: {:#}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested")).unwrap();

        assert_eq!(store.load("missing").unwrap(), None);

        store.save("k", "{\"a\":1}").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.dir().join("k.json").exists());

        store.remove("k").unwrap();
        assert_eq!(store.load("k").unwrap(), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn json_helpers_survive_corrupt_entries() {
        let store = MemoryStore::new();
        store.save("bad", "not json").unwrap();
        assert_eq!(load_json::<Sample>(&store, "bad"), None);

        let sample = Sample {
            name: "powai".to_string(),
            count: 3,
        };
        save_json(&store, "good", &sample);
        assert_eq!(load_json::<Sample>(&store, "good"), Some(sample));
    }
}
