//! Key-value store kept in a hash map.

use std::collections::HashMap;

use tokio::sync::RwLock;

use bizhub_app::ports::KeyValueStore;
use bizhub_domain::error::BizHubError;

/// Volatile blob storage; contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BizHubError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BizHubError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
