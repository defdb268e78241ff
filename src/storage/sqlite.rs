//! `SQLite` implementation of [`StorageProvider`] using `SeaORM`.
//!
//! Each key maps to one row of `store_entries`; the value column holds the JSON
//! text. A row whose text no longer parses comes back as a JSON string holding
//! the raw text, so collection loads treat it as malformed and never write over it.

use async_trait::async_trait;
use sea_orm::{Set, prelude::*};
use serde_json::Value;
use tracing::{trace, warn};

use super::StorageProvider;
use crate::{
    entities::{StoreEntry, store_entry},
    errors::Result,
};

/// Store backed by a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db: DatabaseConnection,
}

impl SqliteStorage {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl StorageProvider for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(entry) = StoreEntry::find()
            .filter(store_entry::Column::Key.eq(key))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        match serde_json::from_str(&entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Stored value for '{}' is not valid JSON: {}", key, e);
                Ok(Some(Value::String(entry.value)))
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        let now = chrono::Utc::now().naive_utc();

        let existing = StoreEntry::find()
            .filter(store_entry::Column::Key.eq(key))
            .one(&self.db)
            .await?;

        if let Some(entry) = existing {
            let mut active_model: store_entry::ActiveModel = entry.into();
            active_model.value = Set(text);
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_entry = store_entry::ActiveModel {
                key: Set(key.to_string()),
                value: Set(text),
                updated_at: Set(now),
                ..Default::default()
            };
            new_entry.insert(&self.db).await?;
        }

        trace!("Wrote store entry '{}'", key);
        Ok(())
    }
}
