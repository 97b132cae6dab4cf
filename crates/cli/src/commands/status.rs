use std::path::Path;

use waymark::{MigrationConfig, MigrationState};

use super::{load_and_connect, migrations_dir};

/// List every known migration plus orphaned ledger rows, ascending.
pub async fn run(dir: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = MigrationConfig::from_env();
    let dir = migrations_dir(&config, dir);
    let (registry, runner) = load_and_connect(&config, &dir).await?;

    let entries = runner.status(&registry).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Migration status:");
    if entries.is_empty() {
        println!("  (no migrations)");
        return Ok(());
    }

    for entry in entries {
        let name = entry.name.as_deref().unwrap_or("<definition missing>");
        match entry.state {
            MigrationState::Pending => {
                println!("  ⏳ {} {}", entry.revision, name);
            }
            MigrationState::Applied { applied_at } => {
                println!(
                    "  ✅ {} {} (applied {})",
                    entry.revision,
                    name,
                    applied_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            MigrationState::Orphaned { applied_at } => {
                println!(
                    "  ⚠️  {} {} (applied {}, orphaned)",
                    entry.revision,
                    name,
                    applied_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
    }
    Ok(())
}
