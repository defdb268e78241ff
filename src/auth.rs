//! Credentials and sessions.
//!
//! Login accounts keep only salted Argon2 PHC strings. Verification goes through
//! the [`CredentialVerifier`] trait so callers never compare secrets themselves,
//! and the resulting [`Session`] is passed explicitly to every workflow that
//! needs to know who is acting.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, info};

use crate::{
    errors::{Error, Result},
    models::{Company, Role, User},
};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Who a verified credential belongs to. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub company_id: Option<String>,
}

impl From<&User> for UserIdentity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            company_id: user.company_id.clone(),
        }
    }
}

/// Checks an email/secret pair and names the account it belongs to.
pub trait CredentialVerifier {
    /// Returns the identity for valid credentials, `None` otherwise.
    fn verify(&self, email: &str, secret: &str) -> Option<UserIdentity>;
}

/// Verifier over the stored `users` collection.
#[derive(Debug, Clone, Default)]
pub struct StoredCredentials {
    users: Vec<User>,
}

impl StoredCredentials {
    /// Builds a verifier over a loaded users collection.
    #[must_use]
    pub const fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

impl CredentialVerifier for StoredCredentials {
    fn verify(&self, email: &str, secret: &str) -> Option<UserIdentity> {
        let user = self.users.iter().find(|u| same_email(&u.email, email))?;

        // Accounts without a hash can never log in.
        let hash = user.password_hash.as_deref()?;
        if verify_password(secret, hash) {
            info!("Credentials accepted for user {}", user.id);
            Some(UserIdentity::from(user))
        } else {
            debug!("Credentials rejected for user {}", user.id);
            None
        }
    }
}

/// Explicit acting context handed to workflows instead of ambient "current user" state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// A platform administrator
    Admin(UserIdentity),
    /// A user acting on behalf of a company
    Company {
        identity: UserIdentity,
        company_id: String,
    },
}

impl Session {
    /// Turns a verified identity into a session.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] for a company account with no company attached.
    pub fn from_identity(identity: UserIdentity) -> Result<Self> {
        match identity.role {
            Role::Admin => Ok(Self::Admin(identity)),
            Role::Company => {
                let company_id = identity.company_id.clone().ok_or_else(|| Error::Unauthorized {
                    message: format!("account {} is not linked to a company", identity.email),
                })?;
                Ok(Self::Company {
                    identity,
                    company_id,
                })
            }
        }
    }

    /// Verifies credentials and opens a session in one step.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] when the credentials are rejected.
    pub fn login<V: CredentialVerifier + ?Sized>(
        verifier: &V,
        email: &str,
        secret: &str,
    ) -> Result<Self> {
        let identity = verifier.verify(email, secret).ok_or_else(|| Error::Unauthorized {
            message: "invalid email or password".to_string(),
        })?;
        Self::from_identity(identity)
    }

    /// The identity behind the session.
    #[must_use]
    pub const fn identity(&self) -> &UserIdentity {
        match self {
            Self::Admin(identity) | Self::Company { identity, .. } => identity,
        }
    }

    /// Ensures the session belongs to an administrator.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] for company sessions.
    pub fn require_admin(&self) -> Result<&UserIdentity> {
        match self {
            Self::Admin(identity) => Ok(identity),
            Self::Company { .. } => Err(Error::Unauthorized {
                message: "administrator role required".to_string(),
            }),
        }
    }

    /// Ensures the session acts for a company and returns that company's id.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] for administrator sessions.
    pub fn require_company(&self) -> Result<&str> {
        match self {
            Self::Company { company_id, .. } => Ok(company_id.as_str()),
            Self::Admin(_) => Err(Error::Unauthorized {
                message: "company account required".to_string(),
            }),
        }
    }
}

/// Hashes a password into a salted Argon2 PHC string.
///
/// # Errors
/// Returns [`Error::PasswordHash`] if hashing fails.
pub fn hash_password(plain_text: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain_text.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a password against a PHC string. An unparseable hash never matches.
#[must_use]
pub fn verify_password(plain_text: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Whether an email is known to the platform (password-recovery lookup).
#[must_use]
pub fn email_registered(users: &[User], companies: &[Company], email: &str) -> bool {
    users.iter().any(|u| same_email(&u.email, email))
        || companies.iter().any(|c| same_email(&c.email, email))
}

/// Emails compare trimmed and case-insensitively.
pub(crate) fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("empresa123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("empresa123", &hash));
        assert!(!verify_password("empresa124", &hash));
        assert!(!verify_password("empresa123", "plaintext"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = hash_password("admin123").unwrap();
        let second = hash_password("admin123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_stored_credentials() {
        let verifier = StoredCredentials::new(vec![
            sample_user("u1", "empresa@hub.com", "empresa123", Role::Company, Some("comp1")),
            User {
                password_hash: None,
                ..sample_user("u2", "legacy@hub.com", "x", Role::Company, Some("comp2"))
            },
        ]);

        let identity = verifier.verify("Empresa@Hub.com", "empresa123").unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.company_id.as_deref(), Some("comp1"));

        assert!(verifier.verify("empresa@hub.com", "wrong").is_none());
        assert!(verifier.verify("nobody@hub.com", "empresa123").is_none());
        assert!(verifier.verify("legacy@hub.com", "x").is_none());
    }

    #[test]
    fn test_session_roles() {
        let verifier = StoredCredentials::new(vec![
            sample_user("a1", "admin@hub.com", "admin123", Role::Admin, None),
            sample_user("u1", "empresa@hub.com", "empresa123", Role::Company, Some("comp1")),
            sample_user("u2", "orphan@hub.com", "orphan123", Role::Company, None),
        ]);

        let admin = Session::login(&verifier, "admin@hub.com", "admin123").unwrap();
        assert!(admin.require_admin().is_ok());
        assert!(matches!(
            admin.require_company(),
            Err(Error::Unauthorized { .. })
        ));

        let company = Session::login(&verifier, "empresa@hub.com", "empresa123").unwrap();
        assert_eq!(company.require_company().unwrap(), "comp1");
        assert!(company.require_admin().is_err());
        assert_eq!(company.identity().email, "empresa@hub.com");

        assert!(Session::login(&verifier, "orphan@hub.com", "orphan123").is_err());
        assert!(Session::login(&verifier, "admin@hub.com", "nope").is_err());
    }

    #[test]
    fn test_email_registered() {
        let users = vec![sample_user("u1", "empresa@hub.com", "pw1234", Role::Company, None)];
        let companies = vec![sample_company("c1", "Tech", true)];

        assert!(email_registered(&users, &companies, "EMPRESA@hub.com"));
        assert!(email_registered(&users, &companies, &companies[0].email));
        assert!(!email_registered(&users, &companies, "ghost@hub.com"));
    }
}
