use std::collections::HashSet;
use std::path::Path;

use waymark::{MigrationConfig, MigrationError, Revision};

use super::{load_and_connect, migrations_dir};

/// Apply every pending migration with a revision at or below the target,
/// ascending. Halts the batch on the first failure.
pub async fn run(target: Option<Revision>, dir: Option<&Path>) -> anyhow::Result<()> {
    let config = MigrationConfig::from_env();
    let dir = migrations_dir(&config, dir);
    let (registry, runner) = load_and_connect(&config, &dir).await?;

    // An explicitly named target must exist.
    if let Some(target) = target {
        if registry.get(target).is_none() {
            return Err(MigrationError::MigrationNotFound(target).into());
        }
    }

    let target = match target.or_else(|| registry.get_all().last().map(|m| m.revision)) {
        Some(target) => target,
        None => {
            println!("No migrations found in {}", dir.display());
            return Ok(());
        }
    };

    let applied: HashSet<Revision> = runner.get_applied_versions().await?.into_iter().collect();

    let mut count = 0;
    for migration in registry.get_all() {
        if migration.revision > target || applied.contains(&migration.revision) {
            continue;
        }
        println!("Applying {} - {}", migration.revision, migration.display_name());
        runner.apply(&registry, migration.revision).await?;
        count += 1;
    }

    if count == 0 {
        println!("Nothing to apply, database is up to date");
    } else {
        println!("Applied {} migration(s)", count);
    }
    Ok(())
}
