//! Store entry entity - one row per storage key.
//!
//! The marketplace persists each collection (`companies`, `products`,
//! `transactions`, `users`) as a single JSON document under its key, mirroring
//! a browser key/value store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key/value row holding a JSON document
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "store_entries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Storage key (e.g., `"companies"`)
    #[sea_orm(unique)]
    pub key: String,
    /// JSON document stored as text
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this key was last written
    pub updated_at: DateTime,
}

/// `StoreEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
