//! # Identity store.
//!
//! String key/value store that holds the id of the current user. Only the
//! authentication task touches it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared handle to an identity store.
pub type IdentityRef = Arc<dyn IdentityStore>;

/// Key/value store for the "current user id".
///
/// An unavailable store behaves like an empty one: `get` returns `None`.
pub trait IdentityStore: Send + Sync + 'static {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
}

/// In-memory [`IdentityStore`].
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a single entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
        store
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}
