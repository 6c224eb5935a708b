//! String-keyed persistence for cart state.
//!
//! The cart is saved after every successful mutation and restored at
//! session start, always under the single namespaced key [`STORAGE_KEY`].
//!
//! Two implementations are provided:
//!
//! - [`JsonFileStore`] - a JSON file holding a key/value map, the
//!   browser-localStorage analogue for CLI and desktop sessions
//! - [`MemoryStore`] - in-process only, for tests and ephemeral sessions

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// The one key the serialized cart lives under.
///
/// Every operation reads and writes this exact key.
pub const STORAGE_KEY: &str = "cartwheel:cart";

/// Errors that can occur reading or writing persisted state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// String-keyed get/set used to save and restore the cart across sessions.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
}

// =============================================================================
// JsonFileStore
// =============================================================================

/// File-backed persistence: one JSON object mapping keys to string values.
///
/// Writes are serialized through an internal lock so concurrent sets do
/// not tear the file.
#[derive(Clone)]
pub struct JsonFileStore {
    inner: Arc<JsonFileStoreInner>,
}

struct JsonFileStoreInner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file is created on first write; a missing file reads as empty.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: Arc::new(JsonFileStoreInner {
                path: path.as_ref().to_path_buf(),
                lock: Mutex::new(()),
            }),
        }
    }

    async fn read_map(&self) -> Result<HashMap<String, String>, PersistError> {
        match tokio::fs::read_to_string(&self.inner.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(PersistError::Io(e)),
        }
    }

    /// Sibling path writes land on before being renamed over the target.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.inner.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let _guard = self.inner.lock.lock().await;
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let _guard = self.inner.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        let contents = serde_json::to_string_pretty(&map)?;

        // Write to a sibling temp file and rename over the target, so a
        // crash mid-write cannot leave a truncated file behind.
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, contents).await?;
        tokio::fs::rename(&tmp_path, &self.inner.path).await?;
        Ok(())
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process persistence, dropped with the session.
#[derive(Clone, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.map.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(STORAGE_KEY).await.unwrap(), None);

        store.set(STORAGE_KEY, "[]").await.unwrap();
        assert_eq!(
            store.get(STORAGE_KEY).await.unwrap().as_deref(),
            Some("[]")
        );

        store.set(STORAGE_KEY, "[1]").await.unwrap();
        assert_eq!(
            store.get(STORAGE_KEY).await.unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[tokio::test]
    async fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("cart.json"));
        assert_eq!(store.get(STORAGE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");

        let store = JsonFileStore::new(&path);
        store.set(STORAGE_KEY, r#"[{"id":1}]"#).await.unwrap();
        store.set("cartwheel:other", "x").await.unwrap();

        // A fresh handle over the same file sees the same data
        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get(STORAGE_KEY).await.unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(
            reopened.get("cartwheel:other").await.unwrap().as_deref(),
            Some("x")
        );
    }

    #[tokio::test]
    async fn test_file_store_writes_are_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");

        // A stale temp file from an interrupted earlier write must not
        // survive or corrupt the next set.
        tokio::fs::write(dir.path().join("cart.json.tmp"), "{trunc")
            .await
            .unwrap();

        let store = JsonFileStore::new(&path);
        store.set(STORAGE_KEY, "[]").await.unwrap();

        assert!(!dir.path().join("cart.json.tmp").exists());
        assert_eq!(
            store.get(STORAGE_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
        // The target itself is complete, parseable JSON
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        serde_json::from_str::<HashMap<String, String>>(&contents).unwrap();
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get(STORAGE_KEY).await,
            Err(PersistError::Format(_))
        ));
    }
}
