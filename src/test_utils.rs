//! Shared test utilities for Portal HUB.
//!
//! This module provides helpers for setting up test storage and building
//! entity records with sensible defaults.

use chrono::{DateTime, Utc};

use crate::{
    auth::{self, Session, UserIdentity},
    core::product::final_price,
    errors::Result,
    models::{Company, Product, Role, Transaction, TransactionStatus, User},
    storage::{PRODUCTS_KEY, SqliteStorage, StorageProvider, save_collection},
};

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for storage-backed tests.
pub async fn setup_test_storage() -> Result<SqliteStorage> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(SqliteStorage::new(db))
}

/// Writes `products` as the whole products collection.
pub async fn seed_products<S: StorageProvider + ?Sized>(
    storage: &S,
    products: &[Product],
) -> Result<()> {
    save_collection(storage, PRODUCTS_KEY, products).await
}

/// Creates a test company.
///
/// # Defaults
/// * email: `contato@<id>.com.br`
/// * tax ID: 45.997.418/0001-53 (valid)
/// * area: "Tecnologia"
pub fn sample_company(id: &str, name: &str, approved: bool) -> Company {
    Company {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("contato@{id}.com.br"),
        tax_id: "45.997.418/0001-53".to_string(),
        area_of_activity: "Tecnologia".to_string(),
        description: format!("{name} description"),
        representative_name: "Representante".to_string(),
        phone: "(11) 3333-4444".to_string(),
        website: None,
        approved,
        created_at: Utc::now(),
    }
}

/// Creates a test product with no discount, tags or description.
pub fn sample_product(
    id: &str,
    owner_company_id: &str,
    name: &str,
    category: &str,
    price: f64,
    approved: bool,
) -> Product {
    Product {
        id: id.to_string(),
        owner_company_id: owner_company_id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price,
        description: String::new(),
        tags: Vec::new(),
        discount_percent: 0.0,
        approved,
        created_at: Utc::now(),
    }
}

/// Builder-style tweaks for [`sample_product`] results.
pub trait ProductFixture {
    /// Replaces the tags.
    #[must_use]
    fn with_tags(self, tags: &[&str]) -> Self;
    /// Replaces the description.
    #[must_use]
    fn with_description(self, description: &str) -> Self;
}

impl ProductFixture for Product {
    fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(ToString::to_string).collect();
        self
    }

    fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Creates a completed transaction, computing the final price from the discount.
pub fn sample_transaction(
    id: &str,
    product_id: &str,
    buyer_company_id: &str,
    seller_company_id: &str,
    original_price: f64,
    discount_percent: f64,
    created_at: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        product_id: product_id.to_string(),
        buyer_company_id: buyer_company_id.to_string(),
        seller_company_id: seller_company_id.to_string(),
        original_price,
        discount_percent,
        final_price: final_price(original_price, discount_percent),
        status: TransactionStatus::Completed,
        created_at,
    }
}

/// Creates a login account whose password is hashed with Argon2.
///
/// # Panics
/// Panics if hashing fails.
#[allow(clippy::unwrap_used)]
pub fn sample_user(
    id: &str,
    email: &str,
    plain_password: &str,
    role: Role,
    company_id: Option<&str>,
) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        password_hash: Some(auth::hash_password(plain_password).unwrap()),
        name: format!("User {id}"),
        role,
        company_id: company_id.map(str::to_string),
    }
}

/// An administrator session that did not go through a credential check.
pub fn admin_session() -> Session {
    Session::Admin(UserIdentity {
        user_id: "admin".to_string(),
        email: "admin@hub.com".to_string(),
        name: "Administrador".to_string(),
        role: Role::Admin,
        company_id: None,
    })
}

/// A session acting for `company_id`.
pub fn company_session(company_id: &str) -> Session {
    Session::Company {
        identity: UserIdentity {
            user_id: format!("user-{company_id}"),
            email: format!("contato@{company_id}.com.br"),
            name: "Empresa".to_string(),
            role: Role::Company,
            company_id: Some(company_id.to_string()),
        },
        company_id: company_id.to_string(),
    }
}
