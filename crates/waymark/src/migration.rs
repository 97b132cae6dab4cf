//! Core migration types: the change unit and its up/down actions.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::fmt;

use crate::revision::Revision;

/// Direction of a migration action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// The SQL body of one up or down action.
///
/// Plain data: a script is parsed out of a definition file at load time and
/// only executed later by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationScript {
    /// Raw SQL text, possibly multiple statements.
    pub sql: String,
}

impl MigrationScript {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Split the script into individually executable statements.
    ///
    /// Uses a real SQL parser, falling back to naive semicolon splitting when
    /// the dialect trips it up.
    pub fn statements(&self) -> Vec<String> {
        let dialect = GenericDialect {};
        match Parser::parse_sql(&dialect, &self.sql) {
            Ok(parsed) => parsed.into_iter().map(|stmt| format!("{};", stmt)).collect(),
            Err(e) => {
                tracing::warn!("SQL parsing failed, using naive semicolon splitting: {}", e);
                self.sql
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| format!("{};", s))
                    .collect()
            }
        }
    }
}

/// One schema change unit: a revision, its name, and whatever actions have
/// been registered for it.
///
/// Created the first time either action is registered for a revision;
/// registering the down action first is legal and leaves `up` empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    /// Identity, immutable once created.
    pub revision: Revision,
    /// Raw name as declared by the definition file.
    pub name: String,
    /// Apply action, if registered.
    pub up: Option<MigrationScript>,
    /// Revert action, if registered.
    pub down: Option<MigrationScript>,
}

impl Migration {
    pub(crate) fn new(revision: Revision, name: impl Into<String>) -> Self {
        Self {
            revision,
            name: name.into(),
            up: None,
            down: None,
        }
    }

    /// Human-friendly form of the name: separators become spaces, first
    /// letter capitalized. Presentation only, never identity.
    pub fn display_name(&self) -> String {
        let spaced = self.name.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }

    pub fn has_up(&self) -> bool {
        self.up.is_some()
    }

    pub fn has_down(&self) -> bool {
        self.down.is_some()
    }
}
