pub mod down;
pub mod generate;
pub mod status;
pub mod up;

use std::path::{Path, PathBuf};

use anyhow::Context;
use waymark::{loader, MigrationConfig, MigrationRegistry, MigrationRunner};

/// Resolve the migrations directory: explicit flag first, config default
/// otherwise.
pub(crate) fn migrations_dir(config: &MigrationConfig, dir: Option<&Path>) -> PathBuf {
    dir.map(Path::to_path_buf)
        .unwrap_or_else(|| config.migrations_dir.clone())
}

/// Load the registry from `dir` and connect a runner for the configured
/// database.
pub(crate) async fn load_and_connect(
    config: &MigrationConfig,
    dir: &Path,
) -> anyhow::Result<(MigrationRegistry, MigrationRunner)> {
    let mut registry = MigrationRegistry::new();
    loader::load(dir, &mut registry)
        .with_context(|| format!("failed to load migrations from {}", dir.display()))?;

    let runner = MigrationRunner::connect(config)
        .await
        .context("failed to connect to database")?;

    Ok((registry, runner))
}
