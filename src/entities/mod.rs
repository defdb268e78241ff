//! Entity module - SeaORM entity definitions for the database.
//! The store is a single key/value table; marketplace records live inside its JSON values.

pub mod store_entry;

pub use store_entry::{Column as StoreEntryColumn, Entity as StoreEntry, Model as StoreEntryModel};
