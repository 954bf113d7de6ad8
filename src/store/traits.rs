//! `KeyValueStore` trait — single async interface for local persistence.

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend-agnostic string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
