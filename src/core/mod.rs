//! Core business logic - framework-agnostic marketplace operations.
//!
//! The tax-ID validator and the query engine are pure functions over loaded
//! collections. The workflow modules (`company`, `product`, `transaction`) load
//! through a [`StorageProvider`](crate::storage::StorageProvider), apply one
//! change and write the collection back.

/// Company registration and approval
pub mod company;
/// Phone display mask
pub mod contact;
/// Product listing, approval and discounts
pub mod product;
/// Lookup, filtering, aggregation and paging over entity collections
pub mod query;
/// Dashboard statistics, display formatting and CSV exports
pub mod report;
/// CNPJ checksum validation and formatting
pub mod tax_id;
/// Simulated purchases
pub mod transaction;
