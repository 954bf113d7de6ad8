//! Identity store — the durable user identifier.
//!
//! The identifier is read from the key-value store once at load. After that
//! reads are served from memory, and every `set` writes through immediately.

use std::sync::Arc;

use crate::store::KeyValueStore;

/// Fixed key of the identity slot.
pub const IDENTITY_KEY: &str = "userId";

/// Owns the user's opaque identity token. Empty means unset.
pub struct IdentityStore {
    store: Arc<dyn KeyValueStore>,
    value: String,
}

impl IdentityStore {
    /// Load the identity from `store`. Read failures yield the empty identity.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let value = match store.get(IDENTITY_KEY).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored identity; starting without one");
                String::new()
            }
        };
        if !value.is_empty() {
            tracing::info!(user_id = %value, "Identity restored");
        }
        Self { store, value }
    }

    /// Current identity, empty when unset.
    pub fn get(&self) -> &str {
        &self.value
    }

    /// Whether an identity has been supplied.
    pub fn is_set(&self) -> bool {
        !self.value.is_empty()
    }

    /// Replace the identity and write it to durable storage.
    ///
    /// A failed write is logged and otherwise ignored; the in-memory value is
    /// updated either way.
    pub async fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        if let Err(e) = self.store.set(IDENTITY_KEY, &self.value).await {
            tracing::warn!(error = %e, "Could not persist identity");
        } else {
            tracing::info!(user_id = %self.value, "Identity saved");
        }
    }
}
