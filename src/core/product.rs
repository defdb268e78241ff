//! Product business logic - listing, approval and discounts.
//!
//! Companies list products, which stay hidden from the catalog until an
//! administrator approves them. Discounts are administrator-only and capped at
//! [`MAX_DISCOUNT_PERCENT`]. Every mutation loads the products collection, changes
//! one record and writes the whole collection back.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::Session,
    errors::{Error, Result},
    models::Product,
    storage::{Collection, PRODUCTS_KEY, StorageProvider},
};

/// Highest discount an administrator may apply.
pub const MAX_DISCOUNT_PERCENT: i64 = 50;

/// Listing form submitted by a company.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub tags: Vec<String>,
}

/// Price after applying a percentage discount.
#[must_use]
pub fn final_price(price: f64, discount_percent: f64) -> f64 {
    price * (1.0 - discount_percent / 100.0)
}

/// Validates a listing form.
///
/// # Errors
/// Returns [`Error::Validation`] for a missing name, category or description and
/// [`Error::InvalidAmount`] for a negative or non-finite price.
pub fn validate_product(input: &NewProduct) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("name", "product name is required"));
    }

    if input.category.trim().is_empty() {
        return Err(Error::validation("category", "category is required"));
    }

    if !input.price.is_finite() || input.price < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.price,
        });
    }

    if input.description.trim().is_empty() {
        return Err(Error::validation("description", "product description is required"));
    }

    Ok(())
}

/// Checks that a discount lies within `0..=MAX_DISCOUNT_PERCENT`.
///
/// # Errors
/// Returns [`Error::InvalidDiscount`] otherwise.
pub fn validate_discount(discount: i64) -> Result<()> {
    if discount < 0 || discount > MAX_DISCOUNT_PERCENT {
        return Err(Error::InvalidDiscount { discount });
    }
    Ok(())
}

/// Lists a new product for the session's company. It starts unapproved with no discount.
///
/// # Errors
/// Returns [`Error::Unauthorized`] for administrator sessions, a validation
/// error, or a storage error.
pub async fn add_product<S: StorageProvider + ?Sized>(
    storage: &S,
    session: &Session,
    input: NewProduct,
) -> Result<Product> {
    let company_id = session.require_company()?;
    validate_product(&input)?;

    let mut products: Collection<Product> = Collection::load(storage, PRODUCTS_KEY).await?;

    let product = Product {
        id: format!("prod-{}", Uuid::new_v4()),
        owner_company_id: company_id.to_string(),
        name: input.name.trim().to_string(),
        category: input.category.trim().to_string(),
        price: input.price,
        description: input.description.trim().to_string(),
        tags: input
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        discount_percent: 0.0,
        approved: false,
        created_at: Utc::now(),
    };

    products.items.push(product.clone());
    products.save(storage).await?;

    info!(
        "Company {} listed product {} ({}), pending approval",
        company_id, product.name, product.id
    );
    Ok(product)
}

/// Loads products, applies `change` to one of them and writes the collection back.
async fn update_product<S, F>(storage: &S, product_id: &str, change: F) -> Result<Product>
where
    S: StorageProvider + ?Sized,
    F: FnOnce(&mut Product),
{
    let mut products: Collection<Product> = Collection::load(storage, PRODUCTS_KEY).await?;

    let product = products
        .items
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })?;
    change(product);
    let updated = product.clone();

    products.save(storage).await?;
    Ok(updated)
}

/// Approves a product for the catalog. Administrator only.
///
/// # Errors
/// Returns [`Error::Unauthorized`], [`Error::ProductNotFound`], or a storage error.
pub async fn approve_product<S: StorageProvider + ?Sized>(
    storage: &S,
    session: &Session,
    product_id: &str,
) -> Result<Product> {
    let admin = session.require_admin()?;
    let product = update_product(storage, product_id, |p| p.approved = true).await?;

    info!("Product {} approved by {}", product.id, admin.email);
    Ok(product)
}

/// Sets a product's live discount. Administrator only.
///
/// Existing transactions keep the discount they were made with.
///
/// # Errors
/// Returns [`Error::Unauthorized`], [`Error::InvalidDiscount`],
/// [`Error::ProductNotFound`], or a storage error.
pub async fn set_discount<S: StorageProvider + ?Sized>(
    storage: &S,
    session: &Session,
    product_id: &str,
    discount: i64,
) -> Result<Product> {
    let admin = session.require_admin()?;
    validate_discount(discount)?;

    #[allow(clippy::cast_precision_loss)]
    let percent = discount as f64;
    let product = update_product(storage, product_id, |p| p.discount_percent = percent).await?;

    info!(
        "Discount on product {} set to {}% by {}",
        product.id, discount, admin.email
    );
    Ok(product)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::storage::{MemoryStorage, load_collection};
    use crate::test_utils::*;
    use serde_json::json;

    fn valid_input() -> NewProduct {
        NewProduct {
            name: "  Licença ERP ".to_string(),
            category: "Software".to_string(),
            price: 2500.0,
            description: "Licença anual".to_string(),
            tags: vec![" erp".to_string(), String::new(), "gestao".to_string()],
        }
    }

    #[test]
    fn test_final_price() {
        assert_eq!(final_price(100.0, 0.0), 100.0);
        assert_eq!(final_price(100.0, 10.0), 90.0);
        assert_eq!(final_price(200.0, 50.0), 100.0);
    }

    #[test]
    fn test_validate_product() {
        assert!(validate_product(&valid_input()).is_ok());

        let mut input = valid_input();
        input.category = String::new();
        assert!(matches!(
            validate_product(&input),
            Err(Error::Validation {
                field: "category",
                ..
            })
        ));

        for price in [-1.0, f64::NAN, f64::INFINITY] {
            let mut input = valid_input();
            input.price = price;
            assert!(matches!(
                validate_product(&input),
                Err(Error::InvalidAmount { .. })
            ));
        }

        let mut input = valid_input();
        input.price = 0.0;
        assert!(validate_product(&input).is_ok());
    }

    #[test]
    fn test_validate_discount_bounds() {
        assert!(validate_discount(0).is_ok());
        assert!(validate_discount(50).is_ok());
        assert!(matches!(
            validate_discount(51),
            Err(Error::InvalidDiscount { discount: 51 })
        ));
        assert!(matches!(
            validate_discount(-1),
            Err(Error::InvalidDiscount { discount: -1 })
        ));
    }

    #[tokio::test]
    async fn test_add_product_starts_pending() -> Result<()> {
        let storage = MemoryStorage::new();
        let session = company_session("comp1");

        let product = add_product(&storage, &session, valid_input()).await?;
        assert_eq!(product.name, "Licença ERP");
        assert_eq!(product.owner_company_id, "comp1");
        assert_eq!(product.tags, vec!["erp", "gestao"]);
        assert!(!product.approved);
        assert_eq!(product.discount_percent, 0.0);

        let stored: Vec<Product> = load_collection(&storage, PRODUCTS_KEY).await?;
        assert_eq!(stored, vec![product]);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_product_requires_company_session() -> Result<()> {
        let storage = MemoryStorage::new();
        let result = add_product(&storage, &admin_session(), valid_input()).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_and_discount_are_admin_only() -> Result<()> {
        let storage = setup_test_storage().await?;
        let product = add_product(&storage, &company_session("comp1"), valid_input()).await?;
        let seller = company_session("comp1");

        assert!(matches!(
            approve_product(&storage, &seller, &product.id).await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            set_discount(&storage, &seller, &product.id, 10).await,
            Err(Error::Unauthorized { .. })
        ));

        let admin = admin_session();
        assert!(approve_product(&storage, &admin, &product.id).await?.approved);

        let discounted = set_discount(&storage, &admin, &product.id, 20).await?;
        assert_eq!(discounted.discount_percent, 20.0);
        assert_eq!(discounted.final_price(), 2000.0);

        assert!(matches!(
            set_discount(&storage, &admin, &product.id, 60).await,
            Err(Error::InvalidDiscount { discount: 60 })
        ));
        assert!(matches!(
            approve_product(&storage, &admin, "prod-missing").await,
            Err(Error::ProductNotFound { .. })
        ));

        let stored: Vec<Product> = load_collection(&storage, PRODUCTS_KEY).await?;
        assert!(stored[0].approved);
        assert_eq!(stored[0].discount_percent, 20.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_discount_keeps_unreadable_products() -> Result<()> {
        let storage = MemoryStorage::new();
        let good = serde_json::to_value(sample_product(
            "p1", "seller", "Mesa", "Móveis", 800.0, true,
        ))?;
        let odd = json!({ "id": "p2", "name": "Sem empresa", "price": "caro" });
        storage.set(PRODUCTS_KEY, json!([good, odd])).await?;

        let updated = set_discount(&storage, &admin_session(), "p1", 10).await?;
        assert_eq!(updated.discount_percent, 10.0);

        let stored = storage.get(PRODUCTS_KEY).await?.unwrap();
        let stored = stored.as_array().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["discount"], json!(10.0));
        assert_eq!(stored[1], odd);

        assert!(matches!(
            set_discount(&storage, &admin_session(), "p2", 10).await,
            Err(Error::ProductNotFound { .. })
        ));
        Ok(())
    }
}
