use std::path::Path;

use waymark::{generate_migration, MigrationConfig};

use super::migrations_dir;

pub fn run(name: &str, dir: Option<&Path>, table: Option<&str>) -> anyhow::Result<()> {
    let config = MigrationConfig::from_env();
    let dir = migrations_dir(&config, dir);

    let path = generate_migration(&dir, name, table)?;
    println!("Generated {}", path.display());
    Ok(())
}
