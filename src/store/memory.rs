//! In-process key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Volatile store; values live as long as the instance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("userId").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStore::new();
        store.set("userId", "alice").await.unwrap();
        store.set("userId", "bob").await.unwrap();
        assert_eq!(store.get("userId").await.unwrap().as_deref(), Some("bob"));
    }
}
