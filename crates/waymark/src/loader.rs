//! Discovery and loading of migration definition files.
//!
//! Loading is two-phase: each file is parsed in isolation into a
//! [`MigrationSource`] (plain data), then its non-empty actions are handed to
//! the registry. Nothing from one file can leak into the parse of another,
//! and no SQL is executed at load time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MigrationError, MigrationResult};
use crate::migration::MigrationScript;
use crate::registry::MigrationRegistry;
use crate::revision::{parse_file_stem, Revision};

/// File extension that marks a migration definition.
pub const MIGRATION_EXTENSION: &str = "sql";

/// One definition file parsed into plain data.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    pub revision: Revision,
    pub name: String,
    /// SQL of the `-- up` section, absent when the section is empty.
    pub up_sql: Option<String>,
    /// SQL of the `-- down` section, absent when the section is empty.
    pub down_sql: Option<String>,
}

/// List definition files directly inside `dir`, newest first.
///
/// Non-recursive; only `.sql` files count. Filenames carry fixed-width
/// revision stamps, so lexical-descending order is newest-revision-first.
/// A missing directory is the only discovery-time failure.
pub fn discover(dir: &Path) -> MigrationResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(MigrationError::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .map_or(false, |ext| ext == MIGRATION_EXTENSION)
        {
            files.push(path);
        }
    }

    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(files)
}

/// Parse a single definition file into a [`MigrationSource`].
///
/// The revision and name come from the filename; the body is split at the
/// `-- up` / `-- down` section markers. A filename that does not split into
/// `<revision>_<name>` is a hard error, never silently skipped.
pub fn parse_source(path: &Path) -> MigrationResult<MigrationSource> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MigrationError::InvalidFileName(path.display().to_string()))?;
    let (revision, name) = parse_file_stem(stem)?;

    let content = fs::read_to_string(path)?;
    let (up_sql, down_sql) = parse_sections(&content);

    Ok(MigrationSource {
        revision,
        name,
        up_sql,
        down_sql,
    })
}

/// Clear `registry` and repopulate it from every definition in `dir`.
///
/// Sources load in discovery order (descending); the registry still answers
/// [`get_all`](MigrationRegistry::get_all) ascending, so load order cannot
/// affect the final contents. On any error the registry is left empty rather
/// than partially populated.
pub fn load(dir: &Path, registry: &mut MigrationRegistry) -> MigrationResult<()> {
    registry.clear();
    if let Err(e) = load_into(dir, registry) {
        registry.clear();
        return Err(e);
    }
    Ok(())
}

fn load_into(dir: &Path, registry: &mut MigrationRegistry) -> MigrationResult<()> {
    for path in discover(dir)? {
        let source = parse_source(&path)?;
        tracing::debug!(
            revision = %source.revision,
            name = %source.name,
            "loaded migration definition"
        );

        if let Some(sql) = source.up_sql {
            registry.register_up(source.revision, &source.name, MigrationScript::new(sql))?;
        }
        if let Some(sql) = source.down_sql {
            registry.register_down(source.revision, &source.name, MigrationScript::new(sql))?;
        }
    }
    Ok(())
}

/// Split a definition body into its up and down SQL.
///
/// Section markers are comment lines starting `-- up` / `-- down`; other
/// comment-only lines and blanks are ignored. An empty section yields `None`.
fn parse_sections(content: &str) -> (Option<String>, Option<String>) {
    enum Section {
        Up,
        Down,
    }

    let mut up = Vec::new();
    let mut down = Vec::new();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        let marker = line.trim().to_lowercase();
        if marker.starts_with("-- up") {
            current = Some(Section::Up);
            continue;
        }
        if marker.starts_with("-- down") {
            current = Some(Section::Down);
            continue;
        }
        if line.trim().is_empty() || line.trim().starts_with("--") {
            continue;
        }

        match current {
            Some(Section::Up) => up.push(line),
            Some(Section::Down) => down.push(line),
            None => {}
        }
    }

    let collect = |lines: Vec<&str>| {
        let sql = lines.join("\n").trim().to_string();
        (!sql.is_empty()).then_some(sql)
    };
    (collect(up), collect(down))
}
