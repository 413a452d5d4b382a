//! Key-value store abstraction backing the planner collections.
//!
//! Each collection is one string blob under one key. Stores have no
//! transactions and no compare-and-swap; callers that read, modify and write
//! back are responsible for serializing those cycles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use weekplan_core::{PlannerError, Result};

/// Trait for string blob storage (allows swapping the backend in tests)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob under `key`, `None` if nothing was ever stored
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the blob under `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store with optional quota, latency and write-protection knobs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    latency: Option<Duration>,
    read_only: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once the total stored bytes would exceed `bytes`
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Sleep before every access, opening a window for interleaving
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a value without counting it as a write
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.get_mut().insert(key.into(), value.into());
        self
    }

    /// Make every subsequent write fail with `AccessDenied`
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of successful `set`/`remove` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current raw blob under `key`, bypassing latency
    pub async fn snapshot(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(PlannerError::AccessDenied(format!(
                "store is read-only, cannot write '{}'",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.delay().await;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.delay().await;
        self.check_writable(key)?;

        let mut entries = self.entries.write().await;
        if let Some(limit) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(PlannerError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.delay().await;
        self.check_writable(key)?;

        self.entries.write().await.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Store keeping each key in `{dir}/{key}.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(PlannerError::Validation(format!(
                "invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn map_io(key: &str, err: std::io::Error) -> PlannerError {
    match err.kind() {
        ErrorKind::PermissionDenied => {
            PlannerError::AccessDenied(format!("'{}': {}", key, err))
        }
        _ => PlannerError::Io(err),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No file for key, treating as absent");
                Ok(None)
            }
            Err(e) => Err(map_io(key, e)),
        }
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display(), bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| map_io(key, e))?;

        // Write-then-rename so readers never observe a half-written blob
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).await.map_err(|e| map_io(key, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| map_io(key, e))?;

        debug!("Wrote {}", path.display());
        Ok(())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("File did not exist, nothing to remove");
                Ok(())
            }
            Err(e) => Err(map_io(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "[]").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[]"));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_quota() {
        let store = MemoryStore::new().with_quota(10);
        store.set("a", "12345").await.unwrap();

        // Replacing a key does not count its old value
        store.set("a", "123456789").await.unwrap();

        let err = store.set("b", "xx").await.unwrap_err();
        assert!(matches!(err, PlannerError::QuotaExceeded { needed: 13, limit: 10, .. }));
        assert_eq!(store.snapshot("b").await, None);
    }

    #[tokio::test]
    async fn test_memory_store_read_only() {
        let store = MemoryStore::new().with_entry("k", "v");
        store.set_read_only(true);

        let err = store.set("k", "w").await.unwrap_err();
        assert!(matches!(err, PlannerError::AccessDenied(_)));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("data"));

        assert_eq!(store.get("tasks").await.unwrap(), None);

        store.set("tasks", "[1,2]").await.unwrap();
        assert!(temp_dir.path().join("data/tasks.json").exists());
        assert_eq!(store.get("tasks").await.unwrap().as_deref(), Some("[1,2]"));

        store.remove("tasks").await.unwrap();
        store.remove("tasks").await.unwrap();
        assert_eq!(store.get("tasks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            let result = store.set(key, "x").await;
            assert!(matches!(result, Err(PlannerError::Validation(_))), "{key}");
        }
    }
}
