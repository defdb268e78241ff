//! Report generation business logic.
//!
//! Read models for the admin panel, the company dashboard, the catalog header
//! and the per-company transaction history, plus the pt-BR formatting, purchase
//! receipts and CSV exports those views use. Everything here works on an already loaded
//! [`Snapshot`] and never fails: references that do not resolve render as
//! placeholder labels.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    core::query::{aggregate, average, filter_by_approval, find_by_id, transactions_for_company},
    models::{Company, Product, Transaction, TransactionStatus},
    storage::Snapshot,
};

/// Label for a company that no longer resolves in admin listings.
pub const NOT_FOUND_LABEL: &str = "Não encontrado";
/// Label for a product that no longer resolves.
pub const PRODUCT_NOT_FOUND_LABEL: &str = "Produto não encontrado";
/// Label for a counterparty company that no longer resolves.
pub const COMPANY_NOT_FOUND_LABEL: &str = "Empresa não encontrada";
/// Placeholder for unresolved references in CSV exports.
pub const CSV_MISSING: &str = "N/A";

const RECEIPT_HEADER: &str = "PORTAL HUB - COMPROVANTE DE TRANSAÇÃO";
const RECEIPT_FOOTER: &str = "Portal HUB - Conectando empresas do Brasil";

const ADMIN_CSV_HEADER: &str = "ID,Produto,Vendedor,Comprador,Valor,Desconto,Status,Data";
const COMPANY_CSV_HEADER: &str =
    "ID,Data,Produto,Empresa,Valor Original,Desconto,Valor Final,Status";

/// Platform-wide numbers shown on the admin reports tab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    /// Every registered company, approved or not
    pub total_companies: usize,
    /// Every listed product, approved or not
    pub total_products: usize,
    /// Sum of final prices over all transactions
    pub total_volume: f64,
}

/// Headline numbers on a company's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_companies: usize,
    pub total_products: usize,
    pub total_transactions: usize,
    pub total_revenue: f64,
}

/// Catalog header numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_products: usize,
    pub total_companies: usize,
    /// Mean live discount of approved products, rounded
    pub avg_discount: i64,
}

/// Purchase summary for one company's transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    /// Final prices paid as buyer
    pub total_spent: f64,
    /// Discounts obtained as buyer
    pub total_saved: f64,
    /// Completed transactions as buyer or seller
    pub total_transactions: usize,
    pub avg_discount: i64,
}

/// Counts and volume over the whole platform.
#[must_use]
pub fn platform_stats(snapshot: &Snapshot) -> PlatformStats {
    PlatformStats {
        total_companies: snapshot.companies.len(),
        total_products: snapshot.products.len(),
        total_volume: aggregate(&snapshot.transactions).total_volume,
    }
}

/// Approved companies and products, and revenue over completed transactions.
#[must_use]
pub fn dashboard_stats(snapshot: &Snapshot) -> DashboardStats {
    let completed = completed(&snapshot.transactions);
    let totals = aggregate(&completed);

    DashboardStats {
        total_companies: filter_by_approval(&snapshot.companies, true).len(),
        total_products: filter_by_approval(&snapshot.products, true).len(),
        total_transactions: totals.count,
        total_revenue: totals.total_volume,
    }
}

/// Approved catalog size and the average discount on offer.
#[must_use]
pub fn catalog_stats(snapshot: &Snapshot) -> CatalogStats {
    let approved = filter_by_approval(&snapshot.products, true);
    let discounts: Vec<f64> = approved.iter().map(|p| p.discount_percent).collect();

    CatalogStats {
        total_products: approved.len(),
        total_companies: filter_by_approval(&snapshot.companies, true).len(),
        avg_discount: average(&discounts),
    }
}

/// Summarizes completed transactions involving `company_id`.
///
/// Spending and savings only count purchases; the count and average discount
/// cover sales too.
#[must_use]
pub fn company_summary(transactions: &[Transaction], company_id: &str) -> CompanySummary {
    let involved = completed(&transactions_for_company(transactions, company_id));
    let purchases: Vec<&Transaction> = involved
        .iter()
        .filter(|t| t.buyer_company_id == company_id)
        .collect();
    let discounts: Vec<f64> = involved.iter().map(|t| t.discount_percent).collect();

    CompanySummary {
        total_spent: purchases.iter().map(|t| t.final_price).sum(),
        total_saved: purchases
            .iter()
            .map(|t| t.original_price - t.final_price)
            .sum(),
        total_transactions: involved.len(),
        avg_discount: average(&discounts),
    }
}

fn completed(transactions: &[Transaction]) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed)
        .cloned()
        .collect()
}

/// A transaction with its references resolved against a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TransactionView<'a> {
    pub transaction: &'a Transaction,
    pub product: Option<&'a Product>,
    pub seller: Option<&'a Company>,
    pub buyer: Option<&'a Company>,
}

impl<'a> TransactionView<'a> {
    /// Resolves product, seller and buyer. Dangling ids resolve to `None`.
    #[must_use]
    pub fn resolve(
        transaction: &'a Transaction,
        products: &'a [Product],
        companies: &'a [Company],
    ) -> Self {
        Self {
            transaction,
            product: find_by_id(products, &transaction.product_id),
            seller: find_by_id(companies, &transaction.seller_company_id),
            buyer: find_by_id(companies, &transaction.buyer_company_id),
        }
    }

    #[must_use]
    pub fn product_label(&self) -> &'a str {
        self.product
            .map_or(PRODUCT_NOT_FOUND_LABEL, |p| p.name.as_str())
    }

    #[must_use]
    pub fn seller_label(&self) -> &'a str {
        self.seller.map_or(NOT_FOUND_LABEL, |c| c.name.as_str())
    }

    #[must_use]
    pub fn buyer_label(&self) -> &'a str {
        self.buyer.map_or(NOT_FOUND_LABEL, |c| c.name.as_str())
    }

    /// Seller name as shown in a company's own history.
    #[must_use]
    pub fn company_label(&self) -> &'a str {
        self.seller
            .map_or(COMPANY_NOT_FOUND_LABEL, |c| c.name.as_str())
    }
}

/// Human label for a transaction status.
#[must_use]
pub const fn status_label(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Completed => "Concluída",
        TransactionStatus::Pending => "Pendente",
        TransactionStatus::Cancelled => "Cancelada",
    }
}

/// Formats a timestamp as `dd/mm/yyyy` (UTC calendar date).
#[must_use]
pub fn format_date(created_at: DateTime<Utc>) -> String {
    created_at.format("%d/%m/%Y").to_string()
}

/// Formats a timestamp as `dd/mm/yyyy HH:MM:SS` (UTC).
#[must_use]
pub fn format_datetime(created_at: DateTime<Utc>) -> String {
    created_at.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234,50`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_brl(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("R$ {sign}{grouped},{:02}", cents % 100)
}

/// Plain-text purchase receipt for one transaction.
///
/// Names the seller side; a missing product or seller prints its placeholder
/// and a missing or blank category prints `N/A`.
#[must_use]
pub fn transaction_receipt(view: &TransactionView<'_>) -> String {
    let transaction = view.transaction;
    let category = view
        .product
        .map(|p| p.category.as_str())
        .filter(|category| !category.trim().is_empty())
        .unwrap_or(CSV_MISSING);
    let savings = transaction.original_price - transaction.final_price;

    [
        RECEIPT_HEADER.to_string(),
        String::new(),
        format!("ID da Transação: {}", transaction.id),
        format!("Data: {}", format_datetime(transaction.created_at)),
        format!("Status: {}", status_label(transaction.status)),
        String::new(),
        "PRODUTO/SERVIÇO:".to_string(),
        view.product_label().to_string(),
        format!("Empresa: {}", view.company_label()),
        format!("Categoria: {category}"),
        String::new(),
        "VALORES:".to_string(),
        format!("Valor Original: {}", format_brl(transaction.original_price)),
        format!("Desconto HUB: {}%", transaction.discount_percent),
        format!("Valor Final: {}", format_brl(transaction.final_price)),
        format!("Economia: {}", format_brl(savings)),
        String::new(),
        RECEIPT_FOOTER.to_string(),
    ]
    .join("\n")
}

/// Admin CSV export over every transaction, in stored order.
#[must_use]
pub fn export_admin_csv(snapshot: &Snapshot) -> String {
    let mut lines = vec![ADMIN_CSV_HEADER.to_string()];

    for transaction in &snapshot.transactions {
        let view = TransactionView::resolve(transaction, &snapshot.products, &snapshot.companies);
        lines.push(csv_row(&[
            transaction.id.as_str(),
            view.product.map_or(CSV_MISSING, |p| p.name.as_str()),
            view.seller.map_or(CSV_MISSING, |c| c.name.as_str()),
            view.buyer.map_or(CSV_MISSING, |c| c.name.as_str()),
            transaction.final_price.to_string().as_str(),
            format!("{}%", transaction.discount_percent).as_str(),
            transaction.status.as_str(),
            format_date(transaction.created_at).as_str(),
        ]));
    }

    lines.join("\n")
}

/// CSV export of the transactions one company took part in, in stored order.
#[must_use]
pub fn export_company_csv(snapshot: &Snapshot, company_id: &str) -> String {
    let mut lines = vec![COMPANY_CSV_HEADER.to_string()];

    for transaction in &transactions_for_company(&snapshot.transactions, company_id) {
        let view = TransactionView::resolve(transaction, &snapshot.products, &snapshot.companies);
        lines.push(csv_row(&[
            transaction.id.as_str(),
            format_date(transaction.created_at).as_str(),
            view.product.map_or(CSV_MISSING, |p| p.name.as_str()),
            view.seller.map_or(CSV_MISSING, |c| c.name.as_str()),
            transaction.original_price.to_string().as_str(),
            format!("{}%", transaction.discount_percent).as_str(),
            transaction.final_price.to_string().as_str(),
            transaction.status.as_str(),
        ]));
    }

    lines.join("\n")
}

fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
