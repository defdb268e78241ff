//! Transaction business logic - simulated purchases.
//!
//! A purchase snapshots the product's price and live discount into a new
//! `completed` transaction. Transactions are never edited afterwards, so later
//! discount changes do not touch purchase history.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::Session,
    core::{
        product::final_price,
        query::{find_by_id, transactions_for_company},
        report::{TransactionView, transaction_receipt},
    },
    errors::{Error, Result},
    models::{Product, Transaction, TransactionStatus},
    storage::{
        Collection, PRODUCTS_KEY, Snapshot, StorageProvider, TRANSACTIONS_KEY, load_collection,
    },
};

/// Builds the transaction record for `buyer_company_id` buying `product` at `now`.
#[must_use]
pub fn new_transaction(product: &Product, buyer_company_id: &str, now: DateTime<Utc>) -> Transaction {
    Transaction {
        id: format!("trans-{}", Uuid::new_v4()),
        product_id: product.id.clone(),
        buyer_company_id: buyer_company_id.to_string(),
        seller_company_id: product.owner_company_id.clone(),
        original_price: product.price,
        discount_percent: product.discount_percent,
        final_price: final_price(product.price, product.discount_percent),
        status: TransactionStatus::Completed,
        created_at: now,
    }
}

/// Buys an approved product on behalf of the session's company.
///
/// # Errors
/// Returns [`Error::Unauthorized`] for administrator sessions,
/// [`Error::ProductNotFound`] when the product is unknown or not approved, or a
/// storage error.
pub async fn purchase<S: StorageProvider + ?Sized>(
    storage: &S,
    session: &Session,
    product_id: &str,
) -> Result<Transaction> {
    let buyer_company_id = session.require_company()?;

    let products: Vec<Product> = load_collection(storage, PRODUCTS_KEY).await?;
    let product = find_by_id(&products, product_id)
        .filter(|p| p.approved)
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })?;

    let transaction = new_transaction(product, buyer_company_id, Utc::now());

    let mut transactions: Collection<Transaction> =
        Collection::load(storage, TRANSACTIONS_KEY).await?;
    transactions.items.push(transaction.clone());
    transactions.save(storage).await?;

    info!(
        "Company {} bought product {} from {} for {:.2} ({}% off)",
        transaction.buyer_company_id,
        transaction.product_id,
        transaction.seller_company_id,
        transaction.final_price,
        transaction.discount_percent
    );
    Ok(transaction)
}

/// Renders the receipt for one of the session company's transactions.
///
/// The company may be either the buyer or the seller.
///
/// # Errors
/// Returns [`Error::Unauthorized`] for administrator sessions and
/// [`Error::TransactionNotFound`] when the id is unknown or belongs to other
/// companies.
pub fn receipt(snapshot: &Snapshot, session: &Session, transaction_id: &str) -> Result<String> {
    let company_id = session.require_company()?;

    let own = transactions_for_company(&snapshot.transactions, company_id);
    let transaction =
        find_by_id(&own, transaction_id).ok_or_else(|| Error::TransactionNotFound {
            id: transaction_id.to_string(),
        })?;

    let view = TransactionView::resolve(transaction, &snapshot.products, &snapshot.companies);
    Ok(transaction_receipt(&view))
}
