//! Storage layer - a get/set-by-key contract over JSON documents.
//!
//! Collections are stored whole under fixed keys. Reads tolerate absent and
//! malformed documents by treating them as empty collections and skip records
//! that do not decode; writes replace the whole document (last write wins, no
//! conflict detection) but never drop records that were merely unreadable.

/// In-process store backed by a `HashMap`
pub mod memory;
/// `SQLite` store backed by the `store_entries` table
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    errors::{Error, Result},
    models::{Company, Product, Transaction, User},
};

/// Key of the companies collection
pub const COMPANIES_KEY: &str = "companies";
/// Key of the products collection
pub const PRODUCTS_KEY: &str = "products";
/// Key of the transactions collection
pub const TRANSACTIONS_KEY: &str = "transactions";
/// Key of the users collection
pub const USERS_KEY: &str = "users";

/// Minimal key/value contract the marketplace persists through.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Returns the document stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replaces the document stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// A collection loaded for a read-modify-write cycle.
///
/// Records that fail to decode are kept aside as raw JSON and written back
/// after the decoded ones, so a write never drops data it could not read. A
/// document that is not an array at all reads as empty and refuses to be
/// written over.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    key: String,
    /// Records that decoded, in stored order
    pub items: Vec<T>,
    unreadable: Vec<Value>,
    malformed: bool,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Loads the collection stored under `key`, decoding record by record.
    ///
    /// # Errors
    /// Returns an error only if the underlying store fails.
    pub async fn load<S: StorageProvider + ?Sized>(storage: &S, key: &str) -> Result<Self> {
        let mut collection = Self {
            key: key.to_string(),
            items: Vec::new(),
            unreadable: Vec::new(),
            malformed: false,
        };

        match storage.get(key).await? {
            None => debug!("No document stored under '{}', using empty collection", key),
            Some(Value::Array(records)) => {
                for record in records {
                    match serde_json::from_value::<T>(record.clone()) {
                        Ok(item) => collection.items.push(item),
                        Err(e) => {
                            warn!("Skipping unreadable record in '{}': {}", key, e);
                            collection.unreadable.push(record);
                        }
                    }
                }
            }
            Some(_) => {
                warn!("Malformed '{}' collection, treating as empty", key);
                collection.malformed = true;
            }
        }

        Ok(collection)
    }

    /// Number of stored records that could not be decoded.
    #[must_use]
    pub fn unreadable_count(&self) -> usize {
        self.unreadable.len()
    }

    /// Writes the decoded records back, followed by the unreadable ones untouched.
    ///
    /// # Errors
    /// Returns [`Error::MalformedCollection`] when the stored document was not
    /// an array, or an error if serialization or the underlying store fails.
    pub async fn save<S: StorageProvider + ?Sized>(&self, storage: &S) -> Result<()> {
        if self.malformed {
            warn!("Refusing to overwrite malformed '{}' collection", self.key);
            return Err(Error::MalformedCollection {
                key: self.key.clone(),
            });
        }

        let mut records = Vec::with_capacity(self.items.len() + self.unreadable.len());
        for item in &self.items {
            records.push(serde_json::to_value(item)?);
        }
        records.extend(self.unreadable.iter().cloned());

        storage.set(&self.key, Value::Array(records)).await?;
        debug!(
            "Saved {} items under '{}' ({} kept unreadable)",
            self.items.len(),
            self.key,
            self.unreadable.len()
        );
        Ok(())
    }
}

/// Loads a collection for reading. Absent or malformed documents read as empty
/// and unreadable records are skipped.
///
/// # Errors
/// Returns an error only if the underlying store fails.
pub async fn load_collection<T, S>(storage: &S, key: &str) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    S: StorageProvider + ?Sized,
{
    Ok(Collection::load(storage, key).await?.items)
}

/// Writes a whole collection under `key`, replacing whatever was there.
///
/// # Errors
/// Returns an error if serialization or the underlying store fails.
pub async fn save_collection<T, S>(storage: &S, key: &str, items: &[T]) -> Result<()>
where
    T: Serialize,
    S: StorageProvider + ?Sized,
{
    let value = serde_json::to_value(items)?;
    storage.set(key, value).await?;
    debug!("Saved {} items under '{}'", items.len(), key);
    Ok(())
}

/// All marketplace collections as read at one point in time.
///
/// The snapshot is never refreshed behind the caller's back; call
/// [`Snapshot::refresh`] on whatever schedule the presentation layer chooses.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub companies: Vec<Company>,
    pub products: Vec<Product>,
    pub transactions: Vec<Transaction>,
    pub users: Vec<User>,
}

impl Snapshot {
    /// Reads every collection from `storage`.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    pub async fn load<S: StorageProvider + ?Sized>(storage: &S) -> Result<Self> {
        Ok(Self {
            companies: load_collection(storage, COMPANIES_KEY).await?,
            products: load_collection(storage, PRODUCTS_KEY).await?,
            transactions: load_collection(storage, TRANSACTIONS_KEY).await?,
            users: load_collection(storage, USERS_KEY).await?,
        })
    }

    /// Re-reads every collection, replacing the current contents.
    ///
    /// On error the snapshot keeps its previous (stale) contents.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    pub async fn refresh<S: StorageProvider + ?Sized>(&mut self, storage: &S) -> Result<()> {
        *self = Self::load(storage).await?;
        debug!(
            "Snapshot refreshed: {} companies, {} products, {} transactions, {} users",
            self.companies.len(),
            self.products.len(),
            self.transactions.len(),
            self.users.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_collection_is_empty() -> Result<()> {
        let storage = MemoryStorage::new();
        let companies: Vec<Company> = load_collection(&storage, COMPANIES_KEY).await?;
        assert!(companies.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_collection_is_empty() -> Result<()> {
        let storage = MemoryStorage::new();
        storage.set(PRODUCTS_KEY, json!({"not": "a list"})).await?;
        storage.set(COMPANIES_KEY, json!([{"id": 7}])).await?;

        let products: Vec<Product> = load_collection(&storage, PRODUCTS_KEY).await?;
        let companies: Vec<Company> = load_collection(&storage, COMPANIES_KEY).await?;
        assert!(products.is_empty());
        assert!(companies.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_record_survives_write_back() -> Result<()> {
        let storage = MemoryStorage::new();
        let good = serde_json::to_value(sample_company("c1", "Alfa", true))?;
        let odd = json!({"id": "c2", "name": "Sem email", "approved": "sim"});
        storage.set(COMPANIES_KEY, json!([good, odd])).await?;

        let mut companies: Collection<Company> = Collection::load(&storage, COMPANIES_KEY).await?;
        assert_eq!(companies.items.len(), 1);
        assert_eq!(companies.unreadable_count(), 1);

        companies.items.push(sample_company("c3", "Gama", false));
        companies.save(&storage).await?;

        let stored = storage.get(COMPANIES_KEY).await?.unwrap();
        let ids: Vec<&str> = stored
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["c1", "c3", "c2"]);
        assert_eq!(stored[2], odd);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_array_document_is_not_overwritten() -> Result<()> {
        let storage = MemoryStorage::new();
        let document = json!({"legacy": true});
        storage.set(PRODUCTS_KEY, document.clone()).await?;

        let mut products: Collection<Product> = Collection::load(&storage, PRODUCTS_KEY).await?;
        assert!(products.items.is_empty());

        products
            .items
            .push(sample_product("p1", "c1", "Mesa", "Móveis", 10.0, false));
        assert!(matches!(
            products.save(&storage).await,
            Err(Error::MalformedCollection { .. })
        ));
        assert_eq!(storage.get(PRODUCTS_KEY).await?, Some(document));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_collection() -> Result<()> {
        let storage = MemoryStorage::new();
        let companies = vec![sample_company("c1", "A", true), sample_company("c2", "B", false)];

        save_collection(&storage, COMPANIES_KEY, &companies).await?;
        let loaded: Vec<Company> = load_collection(&storage, COMPANIES_KEY).await?;
        assert_eq!(loaded, companies);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_refresh_sees_new_writes() -> Result<()> {
        let storage = MemoryStorage::new();
        let mut snapshot = Snapshot::load(&storage).await?;
        assert!(snapshot.companies.is_empty());

        save_collection(&storage, COMPANIES_KEY, &[sample_company("c1", "A", true)]).await?;
        assert!(snapshot.companies.is_empty());

        snapshot.refresh(&storage).await?;
        assert_eq!(snapshot.companies.len(), 1);
        Ok(())
    }
}
