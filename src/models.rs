//! Marketplace records as they are persisted in the key/value store.
//!
//! Field names follow the stored JSON (camelCase, `cnpj`, `area`, `discount`).
//! Numeric fields are lenient: a missing or `null` price, discount or final
//! price reads as zero so aggregation never has to special-case it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::query::{Approvable, Identified};

/// A registered company. Created unapproved; approved only by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Brazilian tax ID (CNPJ), stored as typed by the registrant
    #[serde(rename = "cnpj")]
    pub tax_id: String,
    #[serde(rename = "area", default)]
    pub area_of_activity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub representative_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// A product listed by a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(rename = "companyId")]
    pub owner_company_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "tags_from_list_or_text")]
    pub tags: Vec<String>,
    /// Live discount percentage (0-50), set by an administrator
    #[serde(rename = "discount", default, deserialize_with = "zero_if_null")]
    pub discount_percent: f64,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price after the live discount.
    #[must_use]
    pub fn final_price(&self) -> f64 {
        crate::core::product::final_price(self.price, self.discount_percent)
    }
}

/// Lifecycle of a purchase. Only `Completed` is ever written today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    /// Stored/CSV spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A simulated purchase. The discount is a snapshot taken at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub product_id: String,
    pub buyer_company_id: String,
    pub seller_company_id: String,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub original_price: f64,
    #[serde(rename = "discount", default, deserialize_with = "zero_if_null")]
    pub discount_percent: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub final_price: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// Role attached to a login account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Company,
}

/// A login account. Secrets are kept only as salted Argon2 PHC strings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

// Don't expose the password hash in debug output
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("company_id", &self.company_id)
            .finish()
    }
}

impl Identified for Company {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Product {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Approvable for Company {
    fn is_approved(&self) -> bool {
        self.approved
    }
}

impl Approvable for Product {
    fn is_approved(&self) -> bool {
        self.approved
    }
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Tags were historically stored as one comma-separated string.
fn tags_from_list_or_text<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Text(String),
    }

    let tags = match Option::<Tags>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Tags::List(list)) => list,
        Some(Tags::Text(text)) => text.split(',').map(str::to_string).collect(),
    };

    Ok(tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

/// Seeded demo accounts used numeric ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
