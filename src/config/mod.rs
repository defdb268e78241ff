//! Configuration - database location, seed data and process settings.

/// Database configuration and connection management
pub mod database;

/// Seed companies and accounts loaded from a TOML file
pub mod seed;

use std::path::PathBuf;

/// Default seed file, relative to the working directory.
pub const DEFAULT_SEED_PATH: &str = "seed.toml";

/// Process-level settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    /// `SeaORM` connection URL (`DATABASE_URL`)
    pub database_url: String,
    /// Seed file location (`PORTAL_HUB_SEED`)
    pub seed_path: PathBuf,
}

impl Settings {
    /// Reads settings from environment variables, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            database_url: database::get_database_url(),
            seed_path: std::env::var("PORTAL_HUB_SEED")
                .map_or_else(|_| PathBuf::from(DEFAULT_SEED_PATH), PathBuf::from),
        }
    }
}
