//! Configuration for the migration system.

use std::env;
use std::path::PathBuf;

/// Environment key holding the database connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Connection string used when [`DATABASE_URL_ENV`] is unset: a local
/// file-backed SQLite database, created on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://waymark.db?mode=rwc";

/// Default directory for migration definition files.
pub const DEFAULT_MIGRATIONS_DIR: &str = "db/migrations";

/// Default name of the applied-version ledger table.
pub const DEFAULT_LEDGER_TABLE: &str = "waymark_migrations";

/// Configuration for the migration system.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Database connection string, `sqlite://` or `postgres://`.
    pub database_url: String,
    /// Directory where definition files live.
    pub migrations_dir: PathBuf,
    /// Name of the ledger table tracking applied revisions.
    pub ledger_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }
}

impl MigrationConfig {
    /// Build a config from the environment, falling back to the local
    /// file-backed default when `DATABASE_URL` is unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_sqlite() {
        let config = MigrationConfig::default();
        assert!(config.database_url.starts_with("sqlite://"));
        assert_eq!(config.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(config.ledger_table, "waymark_migrations");
    }
}
