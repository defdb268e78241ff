//! Company business logic - registration and approval.
//!
//! Registration validates the form input in a fixed order and reports the first
//! failure as an error value; nothing here panics on bad input. New companies are
//! always created unapproved. Approval is an administrator-only write-back.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{self, MIN_PASSWORD_LENGTH, Session},
    core::{contact, tax_id},
    errors::{Error, Result},
    models::{Company, Role, User},
    storage::{COMPANIES_KEY, Collection, StorageProvider, USERS_KEY, load_collection},
};

/// Registration form for a company.
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub email: String,
    pub tax_id: String,
    pub area_of_activity: String,
    pub description: String,
    pub representative_name: String,
    pub phone: String,
    pub website: Option<String>,
}

/// Self-service sign-up: a company plus the login account that represents it.
#[derive(Clone, Default)]
pub struct NewAccount {
    pub company: NewCompany,
    pub password: String,
    pub confirm_password: String,
}

/// Whether `email` is already used by any company or user.
#[must_use]
pub fn email_exists(companies: &[Company], users: &[User], email: &str) -> bool {
    auth::email_registered(users, companies, email)
}

/// Whether another company already holds this tax ID (compared digit-for-digit).
#[must_use]
pub fn tax_id_exists(companies: &[Company], candidate: &str) -> bool {
    let digits = tax_id::tax_id_digits(candidate);
    companies
        .iter()
        .any(|company| tax_id::tax_id_digits(&company.tax_id) == digits)
}

fn check_name(input: &NewCompany) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("name", "company name is required"));
    }
    Ok(())
}

fn check_tax_id(input: &NewCompany, companies: &[Company]) -> Result<()> {
    if !tax_id::is_valid_tax_id(&input.tax_id) {
        return Err(Error::InvalidTaxId {
            tax_id: input.tax_id.clone(),
        });
    }

    if tax_id_exists(companies, &input.tax_id) {
        return Err(Error::DuplicateTaxId {
            tax_id: input.tax_id.clone(),
        });
    }

    Ok(())
}

fn check_email(input: &NewCompany, companies: &[Company], users: &[User]) -> Result<()> {
    if !input.email.contains('@') {
        return Err(Error::validation("email", "email address is invalid"));
    }

    if email_exists(companies, users, &input.email) {
        return Err(Error::DuplicateEmail {
            email: input.email.clone(),
        });
    }

    Ok(())
}

fn check_required(value: &str, field: &'static str, message: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, message));
    }
    Ok(())
}

/// Validates the company registration form against the existing collections.
///
/// Checks run in form order: name, tax ID, area, description, representative,
/// email, phone.
///
/// # Errors
/// Returns the first failed check: a missing field ([`Error::Validation`]), an
/// invalid or duplicate tax ID, or a duplicate email.
pub fn validate_company(input: &NewCompany, companies: &[Company], users: &[User]) -> Result<()> {
    check_name(input)?;
    check_tax_id(input, companies)?;
    check_required(&input.area_of_activity, "area", "area of activity is required")?;
    check_required(&input.description, "description", "company description is required")?;
    check_required(
        &input.representative_name,
        "representativeName",
        "representative name is required",
    )?;
    check_email(input, companies, users)?;
    check_required(&input.phone, "phone", "phone is required")
}

/// Validates the self-service sign-up form.
///
/// The sign-up form asks for the password before the contact details and does
/// not require an area of activity. Checks run as name, tax ID, email,
/// password, representative, phone, description.
///
/// # Errors
/// Returns the first failed check, as [`validate_company`] does, plus
/// [`Error::Validation`] on `password` or `confirmPassword`.
pub fn validate_account(input: &NewAccount, companies: &[Company], users: &[User]) -> Result<()> {
    let company = &input.company;
    check_name(company)?;
    check_tax_id(company, companies)?;
    check_email(company, companies, users)?;
    validate_password(&input.password, &input.confirm_password)?;
    check_required(
        &company.representative_name,
        "representativeName",
        "representative name is required",
    )?;
    check_required(&company.phone, "phone", "phone is required")?;
    check_required(&company.description, "description", "company description is required")
}

fn validate_password(password: &str, confirmation: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(
            "password",
            format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }

    if password != confirmation {
        return Err(Error::validation("confirmPassword", "passwords do not match"));
    }

    Ok(())
}

fn build_company(input: NewCompany) -> Company {
    Company {
        id: format!("comp-{}", Uuid::new_v4()),
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        tax_id: tax_id::format_tax_id(&input.tax_id),
        area_of_activity: input.area_of_activity.trim().to_string(),
        description: input.description.trim().to_string(),
        representative_name: input.representative_name.trim().to_string(),
        phone: contact::format_phone(&input.phone),
        website: input
            .website
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty()),
        approved: false,
        created_at: Utc::now(),
    }
}

/// Registers a company awaiting administrator approval.
///
/// # Errors
/// Returns a validation error (see [`validate_company`]) or a storage error.
pub async fn register_company<S: StorageProvider + ?Sized>(
    storage: &S,
    input: NewCompany,
) -> Result<Company> {
    let mut companies: Collection<Company> = Collection::load(storage, COMPANIES_KEY).await?;
    let users: Vec<User> = load_collection(storage, USERS_KEY).await?;

    validate_company(&input, &companies.items, &users)?;

    let company = build_company(input);
    companies.items.push(company.clone());
    companies.save(storage).await?;

    info!("Registered company {} ({}), pending approval", company.name, company.id);
    Ok(company)
}

/// Registers a company together with its login account.
///
/// The account's password is stored only as an Argon2 hash.
///
/// # Errors
/// Returns a validation error (see [`validate_account`]), [`Error::PasswordHash`],
/// or a storage error.
pub async fn register_account<S: StorageProvider + ?Sized>(
    storage: &S,
    input: NewAccount,
) -> Result<(Company, User)> {
    let mut companies: Collection<Company> = Collection::load(storage, COMPANIES_KEY).await?;
    let mut users: Collection<User> = Collection::load(storage, USERS_KEY).await?;

    validate_account(&input, &companies.items, &users.items)?;

    let password_hash = auth::hash_password(&input.password)?;
    let company = build_company(input.company);
    let user = User {
        id: format!("user-{}", Uuid::new_v4()),
        email: company.email.clone(),
        password_hash: Some(password_hash),
        name: company.representative_name.clone(),
        role: Role::Company,
        company_id: Some(company.id.clone()),
    };

    companies.items.push(company.clone());
    users.items.push(user.clone());
    companies.save(storage).await?;
    users.save(storage).await?;

    info!(
        "Registered account {} for company {} ({})",
        user.id, company.name, company.id
    );
    Ok((company, user))
}

/// Marks a company approved. Administrator only.
///
/// # Errors
/// Returns [`Error::Unauthorized`] for non-admin sessions,
/// [`Error::CompanyNotFound`] for an unknown id, or a storage error.
pub async fn approve_company<S: StorageProvider + ?Sized>(
    storage: &S,
    session: &Session,
    company_id: &str,
) -> Result<Company> {
    let admin = session.require_admin()?;
    let mut companies: Collection<Company> = Collection::load(storage, COMPANIES_KEY).await?;

    let company = companies
        .items
        .iter_mut()
        .find(|c| c.id == company_id)
        .ok_or_else(|| Error::CompanyNotFound {
            id: company_id.to_string(),
        })?;
    company.approved = true;
    let approved = company.clone();

    companies.save(storage).await?;

    info!("Company {} approved by {}", approved.id, admin.email);
    Ok(approved)
}
