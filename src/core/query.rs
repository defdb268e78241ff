//! Entity query engine - filtering, ordering, paging and aggregation over loaded collections.
//!
//! Every function here is pure: it takes the collections it needs as arguments and
//! returns a fresh view. Persisting a change (approval, discount) is a separate
//! write-back done by the workflow modules. Dangling references never fail a query;
//! lookups simply come back empty and the presentation layer picks a placeholder.

use std::cmp::Reverse;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Company, Product, Transaction, TransactionStatus};

/// Products per catalog page
pub const CATALOG_PAGE_SIZE: usize = 12;
/// Rows per transaction history page
pub const TRANSACTIONS_PAGE_SIZE: usize = 10;
/// Transactions shown in the dashboard's recent activity
pub const RECENT_TRANSACTIONS_LIMIT: usize = 5;
/// Companies shown in the dashboard's ranking
pub const TOP_COMPANIES_LIMIT: usize = 5;

/// Records addressable by an opaque string id.
pub trait Identified {
    /// The record's unique id.
    fn id(&self) -> &str;
}

/// Records gated by an administrator approval flag.
pub trait Approvable {
    /// Whether an administrator has approved the record.
    fn is_approved(&self) -> bool;
}

/// Linear lookup by id. Absence is a normal answer, not an error.
#[must_use]
pub fn find_by_id<'a, T: Identified>(collection: &'a [T], id: &str) -> Option<&'a T> {
    collection.iter().find(|entity| entity.id() == id)
}

/// Keeps the records whose approval flag equals `approved`.
#[must_use]
pub fn filter_by_approval<T: Approvable + Clone>(collection: &[T], approved: bool) -> Vec<T> {
    collection
        .iter()
        .filter(|entity| entity.is_approved() == approved)
        .cloned()
        .collect()
}

/// Inclusive price band. Without an upper bound it matches any price `>= min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl PriceRange {
    /// Whether `price` falls inside the band.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && self.max.is_none_or(|max| price <= max)
    }
}

impl FromStr for PriceRange {
    type Err = crate::errors::Error;

    /// Parses the catalog filter spelling: `"1000-5000"` or the open-ended `"5000-"`.
    /// An upper bound of zero counts as absent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::errors::Error::validation("priceRange", format!("'{s}'"));
        let (min, max) = s.split_once('-').unwrap_or((s, ""));

        let min: f64 = min.trim().parse().map_err(|_| invalid())?;
        let max = match max.trim() {
            "" => None,
            text => Some(text.parse::<f64>().map_err(|_| invalid())?),
        }
        .filter(|&max| max != 0.0);

        Ok(Self { min, max })
    }
}

/// Catalog filter. Every supplied criterion must hold; omitted ones impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCriteria {
    /// Case-insensitive match against name, description or any tag
    pub search_text: Option<String>,
    /// Exact category
    pub category: Option<String>,
    pub price: Option<PriceRange>,
}

/// Applies [`ProductCriteria`] conjunctively, preserving input order.
#[must_use]
pub fn filter_products(products: &[Product], criteria: &ProductCriteria) -> Vec<Product> {
    let search = normalized_term(criteria.search_text.as_deref());
    let category = criteria.category.as_deref().filter(|c| !c.is_empty());

    products
        .iter()
        .filter(|product| {
            search.as_deref().is_none_or(|term| {
                contains_term(&product.name, term)
                    || contains_term(&product.description, term)
                    || product.tags.iter().any(|tag| contains_term(tag, term))
            })
        })
        .filter(|product| category.is_none_or(|category| product.category == category))
        .filter(|product| criteria.price.is_none_or(|range| range.contains(product.price)))
        .cloned()
        .collect()
}

/// Time window evaluated against a transaction's creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Same calendar date as now
    Today,
    /// The trailing 7x24h window
    Week,
    /// Same calendar month and year as now
    Month,
    /// Same calendar year as now
    Year,
}

impl Period {
    /// Whether `created_at` falls in this period relative to `now` (UTC calendar).
    #[must_use]
    pub fn contains(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Today => created_at.date_naive() == now.date_naive(),
            Self::Week => created_at >= now - Duration::days(7),
            Self::Month => created_at.year() == now.year() && created_at.month() == now.month(),
            Self::Year => created_at.year() == now.year(),
        }
    }
}

impl FromStr for Period {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(crate::errors::Error::validation("period", format!("'{other}'"))),
        }
    }
}

/// Transaction history filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCriteria {
    pub status: Option<TransactionStatus>,
    pub period: Option<Period>,
    /// Case-insensitive match against product name, seller name or transaction id
    pub search_text: Option<String>,
}

/// Filters transactions and orders them newest first.
///
/// `products` and `companies` are only used to resolve names for the text search;
/// a transaction whose product or seller is missing can still match on its id.
#[must_use]
pub fn filter_transactions(
    transactions: &[Transaction],
    products: &[Product],
    companies: &[Company],
    criteria: &TransactionCriteria,
    now: DateTime<Utc>,
) -> Vec<Transaction> {
    let search = normalized_term(criteria.search_text.as_deref());

    let mut filtered: Vec<Transaction> = transactions
        .iter()
        .filter(|t| criteria.status.is_none_or(|status| t.status == status))
        .filter(|t| criteria.period.is_none_or(|period| period.contains(t.created_at, now)))
        .filter(|t| {
            search.as_deref().is_none_or(|term| {
                find_by_id(products, &t.product_id).is_some_and(|p| contains_term(&p.name, term))
                    || find_by_id(companies, &t.seller_company_id)
                        .is_some_and(|c| contains_term(&c.name, term))
                    || contains_term(&t.id, term)
            })
        })
        .cloned()
        .collect();

    sort_newest_first(&mut filtered);
    filtered
}

/// Sum of final prices plus the number of transactions considered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_volume: f64,
    pub count: usize,
}

/// Totals over whatever subset the caller passes (platform-wide or per company).
#[must_use]
pub fn aggregate(transactions: &[Transaction]) -> Totals {
    Totals {
        total_volume: transactions.iter().map(|t| t.final_price).sum(),
        count: transactions.len(),
    }
}

/// An approved company with its activity counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyActivity {
    #[serde(flatten)]
    pub company: Company,
    /// Approved products owned by the company
    pub products_count: usize,
    /// Transactions where the company is the seller
    pub transactions_count: usize,
}

/// Ranks approved companies by sales count, descending. Ties keep input order.
#[must_use]
pub fn top_by_activity(
    companies: &[Company],
    transactions: &[Transaction],
    products: &[Product],
    limit: usize,
) -> Vec<CompanyActivity> {
    let mut ranked: Vec<CompanyActivity> = companies
        .iter()
        .filter(|company| company.approved)
        .map(|company| CompanyActivity {
            products_count: products
                .iter()
                .filter(|p| p.approved && p.owner_company_id == company.id)
                .count(),
            transactions_count: transactions
                .iter()
                .filter(|t| t.seller_company_id == company.id)
                .count(),
            company: company.clone(),
        })
        .collect();

    ranked.sort_by_key(|activity| Reverse(activity.transactions_count));
    ranked.truncate(limit);
    ranked
}

/// Arithmetic mean rounded to the nearest integer; 0 when empty.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn average(values: &[f64]) -> i64 {
    if values.is_empty() {
        return 0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    // Halves round up, never away from zero.
    (mean + 0.5).floor() as i64
}

/// One page of a larger result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Slices `items` into a 1-based page. Page 0 is treated as page 1; a page past
/// the end is empty.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let total = items.len();
    let total_pages = if per_page == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total,
        total_pages,
    }
}

/// The `limit` most recent transactions, newest first.
#[must_use]
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut recent = transactions.to_vec();
    sort_newest_first(&mut recent);
    recent.truncate(limit);
    recent
}

/// Transactions where the company is the buyer or the seller.
#[must_use]
pub fn transactions_for_company(transactions: &[Transaction], company_id: &str) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.buyer_company_id == company_id || t.seller_company_id == company_id)
        .cloned()
        .collect()
}

fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|t| Reverse(t.created_at));
}

fn normalized_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
}

fn contains_term(haystack: &str, lowercase_term: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_term)
}
