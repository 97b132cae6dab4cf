//! # waymark: revision-tracked database migrations
//!
//! Waymark discovers SQL migration definitions on disk, registers them in an
//! in-memory [`MigrationRegistry`] keyed by revision, and reconciles that
//! registry against a durable ledger of applied revisions owned by the
//! [`MigrationRunner`].
//!
//! A definition is one file named `<revision>_<name>.sql`, its body split by
//! `-- up` / `-- down` section markers:
//!
//! ```sql
//! -- up
//! CREATE TABLE spaceships (
//!     id INTEGER PRIMARY KEY,
//!     name VARCHAR(255)
//! );
//!
//! -- down
//! DROP TABLE spaceships;
//! ```
//!
//! The registry is rebuilt from disk on every load and is ephemeral; the
//! ledger is the single source of truth for what has actually run. A revision
//! known to both is applied, known only to the registry is pending, and known
//! only to the ledger is orphaned.
//!
//! ```no_run
//! use waymark::{loader, MigrationConfig, MigrationRegistry, MigrationRunner, Revision};
//!
//! # async fn demo() -> waymark::MigrationResult<()> {
//! let mut registry = MigrationRegistry::new();
//! loader::load("db/migrations".as_ref(), &mut registry)?;
//!
//! let runner = MigrationRunner::connect(&MigrationConfig::from_env()).await?;
//! runner.apply(&registry, Revision::new(20240101000000)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod migration;
pub mod registry;
pub mod revision;
pub mod runner;
pub mod schema;

pub use config::MigrationConfig;
pub use error::{MigrationError, MigrationResult};
pub use generator::{generate_migration, generate_revision};
pub use loader::{discover, load, parse_source, MigrationSource};
pub use migration::{Direction, Migration, MigrationScript};
pub use registry::MigrationRegistry;
pub use revision::Revision;
pub use runner::{AppliedMigration, MigrationRunner, MigrationState, StatusEntry};
pub use schema::{ChangeBuilder, SchemaBuilder, TableBuilder};
