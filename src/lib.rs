pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod schema;

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub use config::{ClientConfig, ConfigError};
pub use db::{create_pool, DbPool};
pub use domain::errors::DomainError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Storage(e.to_string()))?;
    if !applied.is_empty() {
        log::info!("applied {} migration(s)", applied.len());
    }
    Ok(())
}
