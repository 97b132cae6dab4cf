//! Revision identity: the ordered integer that names one migration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MigrationError, MigrationResult};

/// Unique, totally-ordered identity of a single migration.
///
/// Revisions are timestamp-like integers (e.g. `20240101000000`) taken from
/// the leading component of a definition file's name. Fixed-width stamps keep
/// lexical filename order consistent with numeric order, so concurrently
/// authored migrations rarely collide; when they do, registration detects the
/// collision instead of merging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    pub const fn new(value: i64) -> Self {
        Revision(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for Revision {
    fn from(value: i64) -> Self {
        Revision(value)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a definition file stem into its revision and name.
///
/// The stem must have exactly the shape `<revision>_<name>` with a
/// non-negative integer revision and a non-empty name.
pub fn parse_file_stem(stem: &str) -> MigrationResult<(Revision, String)> {
    let (prefix, name) = stem
        .split_once('_')
        .ok_or_else(|| MigrationError::InvalidFileName(stem.to_string()))?;

    let value: i64 = prefix
        .parse()
        .map_err(|_| MigrationError::InvalidFileName(stem.to_string()))?;

    if value < 0 || name.is_empty() {
        return Err(MigrationError::InvalidFileName(stem.to_string()));
    }

    Ok((Revision(value), name.to_string()))
}
