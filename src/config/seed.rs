//! Seed data loading from seed.toml
//!
//! The seed file lists the companies and login accounts a fresh store starts
//! with. Each collection is written only when storage has nothing under its
//! key, so seeding never overwrites live data. Accounts may carry a plaintext
//! `password`, which is hashed before it is stored, or a ready `password_hash`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::{
    auth::hash_password,
    core::tax_id::is_valid_tax_id,
    errors::{Error, Result},
    models::{Company, Role, User},
    storage::{COMPANIES_KEY, StorageProvider, USERS_KEY, save_collection},
};

/// Structure of the whole seed file
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    /// Companies to create on first run
    #[serde(default)]
    pub companies: Vec<SeedCompany>,
    /// Login accounts to create on first run
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// A company entry in the seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCompany {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(alias = "cnpj")]
    pub tax_id: String,
    #[serde(alias = "area", default)]
    pub area_of_activity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub representative_name: String,
    #[serde(default)]
    pub phone: String,
    pub website: Option<String>,
    #[serde(default)]
    pub approved: bool,
    /// Registration time; defaults to the moment of seeding
    pub created_at: Option<DateTime<Utc>>,
}

/// A login account entry in the seed file
#[derive(Clone, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    pub company_id: Option<String>,
    /// Plaintext password, hashed at seed time
    pub password: Option<String>,
    /// Pre-computed Argon2 PHC string
    pub password_hash: Option<String>,
}

// Don't expose seed passwords in debug output
impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("company_id", &self.company_id)
            .finish_non_exhaustive()
    }
}

/// How many records each collection received from the seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    /// 0 when the companies collection already existed
    pub companies: usize,
    /// 0 when the users collection already existed
    pub users: usize,
}

impl SeedCompany {
    fn into_company(self, now: DateTime<Utc>) -> Company {
        if !is_valid_tax_id(&self.tax_id) {
            warn!(
                "Seed company {} has a tax ID that fails the checksum: {}",
                self.id, self.tax_id
            );
        }

        Company {
            id: self.id,
            name: self.name,
            email: self.email,
            tax_id: self.tax_id,
            area_of_activity: self.area_of_activity,
            description: self.description,
            representative_name: self.representative_name,
            phone: self.phone,
            website: self.website,
            approved: self.approved,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

impl SeedUser {
    fn into_user(self) -> Result<User> {
        let password_hash = match (self.password_hash, self.password) {
            (Some(hash), _) => Some(hash),
            (None, Some(plain_text)) => Some(hash_password(&plain_text)?),
            (None, None) => {
                warn!("Seed user {} has no password and cannot log in", self.id);
                None
            }
        };

        Ok(User {
            id: self.id,
            email: self.email,
            password_hash,
            name: self.name,
            role: self.role,
            company_id: self.company_id,
        })
    }
}

/// Parses seed data from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is invalid or a required field is missing.
pub fn parse_seed(contents: &str) -> Result<SeedFile> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

/// Loads seed data from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<SeedFile> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read seed file: {e}"),
    })?;
    parse_seed(&contents)
}

/// Writes seed collections that are missing from storage.
///
/// # Errors
/// Returns an error if hashing a seed password or the underlying store fails.
pub async fn seed_storage<S: StorageProvider + ?Sized>(
    storage: &S,
    seed: SeedFile,
) -> Result<SeedOutcome> {
    let mut outcome = SeedOutcome::default();

    if storage.get(COMPANIES_KEY).await?.is_none() {
        let now = Utc::now();
        let companies: Vec<Company> = seed
            .companies
            .into_iter()
            .map(|company| company.into_company(now))
            .collect();
        save_collection(storage, COMPANIES_KEY, &companies).await?;
        outcome.companies = companies.len();
        info!("Seeded {} companies", companies.len());
    } else {
        info!("Companies already present, skipping company seed");
    }

    if storage.get(USERS_KEY).await?.is_none() {
        let users = seed
            .users
            .into_iter()
            .map(SeedUser::into_user)
            .collect::<Result<Vec<User>>>()?;
        save_collection(storage, USERS_KEY, &users).await?;
        outcome.users = users.len();
        info!("Seeded {} user accounts", users.len());
    } else {
        info!("Users already present, skipping user seed");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::auth::verify_password;
    use crate::storage::{MemoryStorage, load_collection};
    use crate::test_utils::*;

    const SEED: &str = r#"
        [[companies]]
        id = "comp1"
        name = "TechSolutions Ltda"
        email = "contato@techsolutions.com"
        cnpj = "11.222.333/0001-81"
        area = "Tecnologia"
        representative_name = "João Silva"
        phone = "(11) 99999-9999"
        website = "https://techsolutions.com"
        approved = true
        created_at = "2024-01-15T00:00:00Z"

        [[users]]
        id = "admin1"
        email = "admin@hub.com"
        password = "admin123"
        name = "Administrador"
        role = "admin"

        [[users]]
        id = "1"
        email = "empresa@hub.com"
        password = "empresa123"
        name = "Empresa Exemplo"
        role = "company"
        company_id = "comp1"
    "#;

    #[test]
    fn test_parse_seed() {
        let seed = parse_seed(SEED).unwrap();
        assert_eq!(seed.companies.len(), 1);
        assert_eq!(seed.companies[0].tax_id, "11.222.333/0001-81");
        assert_eq!(seed.companies[0].area_of_activity, "Tecnologia");
        assert!(seed.companies[0].approved);

        assert_eq!(seed.users.len(), 2);
        assert_eq!(seed.users[0].role, Role::Admin);
        assert_eq!(seed.users[1].company_id.as_deref(), Some("comp1"));
        assert!(!format!("{:?}", seed.users[0]).contains("admin123"));
    }

    #[test]
    fn test_parse_seed_rejects_bad_role() {
        let result = parse_seed(
            r#"
            [[users]]
            id = "x"
            email = "x@hub.com"
            role = "superuser"
        "#,
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_seed_missing_file() {
        let result = load_seed("does/not/exist/seed.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_seed_storage_hashes_passwords() -> Result<()> {
        let storage = setup_test_storage().await?;

        let outcome = seed_storage(&storage, parse_seed(SEED)?).await?;
        assert_eq!(outcome, SeedOutcome { companies: 1, users: 2 });

        let users: Vec<User> = load_collection(&storage, USERS_KEY).await?;
        let hash = users[1].password_hash.as_deref().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("empresa123", hash));

        let companies: Vec<Company> = load_collection(&storage, COMPANIES_KEY).await?;
        assert_eq!(companies[0].created_at.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_storage_keeps_existing_collections() -> Result<()> {
        let storage = MemoryStorage::new();
        let existing = vec![sample_company("c9", "Existente", false)];
        save_collection(&storage, COMPANIES_KEY, &existing).await?;

        let outcome = seed_storage(&storage, parse_seed(SEED)?).await?;
        assert_eq!(outcome.companies, 0);
        assert_eq!(outcome.users, 2);

        let companies: Vec<Company> = load_collection(&storage, COMPANIES_KEY).await?;
        assert_eq!(companies, existing);
        Ok(())
    }
}
