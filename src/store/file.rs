//! File-backed key-value store.
//!
//! All keys live in one JSON object on disk. Every `set` rewrites the file
//! immediately; there is no batching. Writes go to a sibling temp file that
//! is renamed over the original, so a reader never sees a half-written file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Durable store rooted at a single JSON file.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Sibling path the next version is written to before the rename.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut values = self.load().await?;
        Ok(values.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        // A damaged file must not block every later write.
        let mut values = match self.load().await {
            Ok(values) => values,
            Err(StoreError::Serialization(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Store file is unreadable; rewriting it from scratch"
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&values)?;
        let temp = self.temp_path();
        fs::write(&temp, json).await?;
        fs::rename(&temp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), key, "Store value written");
        Ok(())
    }
}
