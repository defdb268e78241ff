use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::StorageProvider;
use crate::errors::Result;

/// Volatile store, useful for tests and one-off sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_last_write_wins() -> Result<()> {
        let storage = MemoryStorage::new();
        assert!(storage.get("users").await?.is_none());

        storage.set("users", json!([1])).await?;
        storage.set("users", json!([2])).await?;
        assert_eq!(storage.get("users").await?, Some(json!([2])));
        Ok(())
    }
}
