//! Error types for the migration system.

use std::path::PathBuf;
use thiserror::Error;

use crate::migration::Direction;
use crate::revision::Revision;

/// Result type alias for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A second up or down action was registered for an already-bound
    /// revision. Authoring error, fatal to the load.
    #[error("'{direction}' action already registered for revision {revision}")]
    DuplicateMigration {
        revision: Revision,
        direction: Direction,
    },

    /// The requested revision is not in the registry.
    #[error("no migration registered for revision {0}")]
    MigrationNotFound(Revision),

    /// The migration exists but has no action for the requested direction.
    #[error("migration {revision} has no '{direction}' action")]
    ActionMissing {
        revision: Revision,
        direction: Direction,
    },

    /// An action's SQL failed to execute. The ledger is left untouched.
    #[error("migration {revision} failed: {source}")]
    Execution {
        revision: Revision,
        #[source]
        source: sqlx::Error,
    },

    /// The ledger already holds a row for this revision.
    #[error("revision {0} is already recorded as applied")]
    AlreadyRecorded(Revision),

    /// The migrations directory does not exist.
    #[error("migrations directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// A definition file's name does not split into `<revision>_<name>`.
    #[error("invalid migration file name '{0}', expected <revision>_<name>.sql")]
    InvalidFileName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid ledger timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}
