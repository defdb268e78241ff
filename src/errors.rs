//! Unified error type for storage, workflow and configuration failures.
//!
//! The pure query engine and tax-ID validator never produce these; they answer
//! with plain values. Everything that touches the store or validates user input
//! returns [`Result`].

use thiserror::Error;

/// Errors raised by marketplace workflows and the storage layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A required field is missing or malformed
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending input field
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// Tax ID failed the check-digit validation
    #[error("Invalid tax ID: {tax_id}")]
    InvalidTaxId {
        /// The rejected input, as supplied
        tax_id: String,
    },

    /// Email already used by a company or a user
    #[error("Email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email
        email: String,
    },

    /// Tax ID already used by another company
    #[error("Tax ID already registered: {tax_id}")]
    DuplicateTaxId {
        /// The conflicting tax ID
        tax_id: String,
    },

    /// Negative or non-finite price
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Discount outside the 0-50% window
    #[error("Invalid discount: {discount}% (must be between 0% and 50%)")]
    InvalidDiscount {
        /// The rejected percentage
        discount: i64,
    },

    /// No company with this id
    #[error("Company not found: {id}")]
    CompanyNotFound {
        /// The id that did not resolve
        id: String,
    },

    /// No (purchasable) product with this id
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// The id that did not resolve
        id: String,
    },

    /// No transaction with this id among the session company's own
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// The id that did not resolve
        id: String,
    },

    /// Session role does not allow the operation
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the session was refused
        message: String,
    },

    /// Stored document under this key is not a JSON array and must not be overwritten
    #[error("Stored collection '{key}' is malformed; refusing to overwrite it")]
    MalformedCollection {
        /// Storage key of the collection
        key: String,
    },
    /// Password hashing or hash parsing failed
    #[error("Password hash error: {message}")]
    PasswordHash {
        /// Underlying hasher message
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
