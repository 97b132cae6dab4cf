//! In-memory registry mapping revisions to migration records.

use std::collections::BTreeMap;

use crate::error::{MigrationError, MigrationResult};
use crate::migration::{Direction, Migration, MigrationScript};
use crate::revision::Revision;

/// Ephemeral mapping from revision to migration record.
///
/// Rebuilt from the definition directory on every load; the durable ledger
/// owned by the runner remains the authority on what has actually been
/// applied. The registry is an explicitly owned value, passed by reference to
/// the loader and the runner.
///
/// Individual entries are never deleted. A partial record (say, only a down
/// action surviving) would be inconsistent, so deletion is all-or-nothing via
/// [`clear`](MigrationRegistry::clear).
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<Revision, Migration>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `script` as the up action for `revision`, creating the record if
    /// this is the revision's first registration.
    ///
    /// A revision accepts at most one up action; a second attempt fails with
    /// [`MigrationError::DuplicateMigration`] and leaves the first binding
    /// intact.
    pub fn register_up(
        &mut self,
        revision: Revision,
        name: &str,
        script: MigrationScript,
    ) -> MigrationResult<()> {
        self.register(revision, name, Direction::Up, script)
    }

    /// Bind `script` as the down action for `revision`. Symmetric to
    /// [`register_up`](MigrationRegistry::register_up); registering a down
    /// action first is legal and leaves `up` empty.
    pub fn register_down(
        &mut self,
        revision: Revision,
        name: &str,
        script: MigrationScript,
    ) -> MigrationResult<()> {
        self.register(revision, name, Direction::Down, script)
    }

    fn register(
        &mut self,
        revision: Revision,
        name: &str,
        direction: Direction,
        script: MigrationScript,
    ) -> MigrationResult<()> {
        let migration = self
            .migrations
            .entry(revision)
            .or_insert_with(|| Migration::new(revision, name));

        let slot = match direction {
            Direction::Up => &mut migration.up,
            Direction::Down => &mut migration.down,
        };
        if slot.is_some() {
            return Err(MigrationError::DuplicateMigration {
                revision,
                direction,
            });
        }
        *slot = Some(script);
        Ok(())
    }

    /// Look up a revision. Never constructs a placeholder for a miss.
    pub fn get(&self, revision: Revision) -> Option<&Migration> {
        self.migrations.get(&revision)
    }

    /// All registered migrations, ascending by revision.
    ///
    /// Every consumer depends on this order; ties are impossible because the
    /// revision is the map key.
    pub fn get_all(&self) -> Vec<&Migration> {
        self.migrations.values().collect()
    }

    /// Empty the registry. Used before a fresh load so the contents reflect
    /// only the current on-disk definition set.
    pub fn clear(&mut self) {
        self.migrations.clear();
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl<'a> IntoIterator for &'a MigrationRegistry {
    type Item = &'a Migration;
    type IntoIter = std::collections::btree_map::Values<'a, Revision, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.values()
    }
}
