use std::path::Path;

use anyhow::bail;
use waymark::{MigrationConfig, Revision};

use super::{load_and_connect, migrations_dir};

/// Revert the target revision, defaulting to the most recently applied.
pub async fn run(target: Option<Revision>, dir: Option<&Path>) -> anyhow::Result<()> {
    let config = MigrationConfig::from_env();
    let dir = migrations_dir(&config, dir);
    let (registry, runner) = load_and_connect(&config, &dir).await?;

    let applied = runner.get_applied_versions().await?;
    let target = match target.or_else(|| applied.last().copied()) {
        Some(target) => target,
        None => {
            println!("No applied migrations to revert");
            return Ok(());
        }
    };

    if !applied.contains(&target) {
        bail!("revision {} is not applied", target);
    }

    let Some(migration) = registry.get(target) else {
        bail!(
            "revision {} is applied but its definition is missing from {}",
            target,
            dir.display()
        );
    };

    println!("Reverting {} - {}", migration.revision, migration.display_name());
    runner.revert(&registry, target).await?;
    println!("Reverted {}", target);
    Ok(())
}
