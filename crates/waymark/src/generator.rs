//! Scaffolding for new migration definition files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{MigrationError, MigrationResult};
use crate::schema::SchemaBuilder;

/// Timestamp-based revision stamp, e.g. `20251003154520`.
///
/// Fixed-width and second-granular, so stamps from different contributors
/// sort lexically the same way they sort numerically and rarely collide.
pub fn generate_revision() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Create a definition file `<revision>_<name>.sql` under `dir`, creating
/// the directory if needed.
///
/// With `table`, the up section scaffolds a CREATE TABLE for it and the
/// down section drops it; otherwise both sections are left blank for the
/// author to fill in.
pub fn generate_migration(
    dir: &Path,
    name: &str,
    table: Option<&str>,
) -> MigrationResult<PathBuf> {
    let name = name.trim().replace(' ', "_").to_lowercase();
    if name.is_empty() {
        return Err(MigrationError::InvalidFileName(name));
    }

    fs::create_dir_all(dir)?;

    let revision = generate_revision();
    let path = dir.join(format!("{}_{}.sql", revision, name));

    let (up_body, down_body) = match table {
        Some(table) => {
            let mut up = SchemaBuilder::new();
            up.create_table(table, |t| {
                t.timestamps();
            });
            let mut down = SchemaBuilder::new();
            down.drop_table(table);
            (up.build(), down.build())
        }
        None => (String::new(), String::new()),
    };

    let content = format!(
        "-- Migration: {name}\n\
         -- Revision: {revision}\n\
         -- Created: {created}\n\
         \n\
         -- up\n\
         {up}\n\
         \n\
         -- down\n\
         {down}\n",
        name = name,
        revision = revision,
        created = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        up = up_body,
        down = down_body,
    );
    fs::write(&path, content)?;

    tracing::debug!(path = %path.display(), "generated migration file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use tempfile::TempDir;

    #[test]
    fn revision_stamp_is_a_fixed_width_numeral() {
        let stamp = generate_revision();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.parse::<i64>().is_ok());
    }

    #[test]
    fn generated_file_round_trips_through_the_loader() {
        let dir = TempDir::new().unwrap();
        let path = generate_migration(dir.path(), "create_users", None).unwrap();

        let source = loader::parse_source(&path).unwrap();
        assert_eq!(source.name, "create_users");
        // A blank template carries no actions yet.
        assert!(source.up_sql.is_none());
        assert!(source.down_sql.is_none());
    }

    #[test]
    fn table_scaffold_creates_and_drops() {
        let dir = TempDir::new().unwrap();
        let path = generate_migration(dir.path(), "create_users", Some("users")).unwrap();

        let source = loader::parse_source(&path).unwrap();
        let up = source.up_sql.unwrap();
        assert!(up.contains("CREATE TABLE users"));
        assert!(up.contains("id INTEGER PRIMARY KEY"));
        assert_eq!(source.down_sql.as_deref(), Some("DROP TABLE users;"));
    }

    #[test]
    fn spaces_in_the_name_become_separators() {
        let dir = TempDir::new().unwrap();
        let path = generate_migration(dir.path(), "Add Widget Table", None).unwrap();
        let source = loader::parse_source(&path).unwrap();
        assert_eq!(source.name, "add_widget_table");
    }

    #[test]
    fn blank_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = generate_migration(dir.path(), "   ", None).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidFileName(_)));
    }

    #[test]
    fn creates_the_directory_when_missing() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("db").join("migrations");
        let path = generate_migration(&nested, "first", None).unwrap();
        assert!(path.exists());
    }
}
