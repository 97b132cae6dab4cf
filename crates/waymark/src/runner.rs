//! Runner: reconciles registered migrations against the durable ledger.

use std::collections::BTreeMap;
use std::sync::Once;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::migration::{Direction, MigrationScript};
use crate::registry::MigrationRegistry;
use crate::revision::Revision;

static INSTALL_DRIVERS: Once = Once::new();

/// Ledger row for one applied revision.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub version: Revision,
    pub applied_at: DateTime<Utc>,
}

/// Derived state of one revision, computed by comparing the registry with
/// the ledger. Never stored; there is no persisted failure state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Known to the registry, not yet applied.
    Pending,
    /// Known and applied.
    Applied { applied_at: DateTime<Utc> },
    /// Applied per the ledger but no longer among the loaded definitions.
    Orphaned { applied_at: DateTime<Utc> },
}

/// One row of status output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub revision: Revision,
    /// Absent for orphaned revisions, whose definition no longer exists.
    pub name: Option<String>,
    pub state: MigrationState,
}

/// Executes migration actions and owns the applied-version ledger.
///
/// The ledger is the single source of truth for what has run against the
/// database, independent of what the registry currently knows. Applying is
/// at-least-once: the schema change and the ledger write are two separate
/// durable steps, so a crash between them leaves a revision whose DDL has
/// run but which still reads as pending; the operator resolves that by hand.
///
/// A runner holds one connection pool, built at construction and dropped
/// with it. It is not meant for concurrent use from multiple tasks; callers
/// needing that serialize access themselves.
pub struct MigrationRunner {
    pool: AnyPool,
    ledger_table: String,
}

impl MigrationRunner {
    /// Connect to the configured database and bootstrap the ledger table.
    pub async fn connect(config: &MigrationConfig) -> MigrationResult<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await?;
        tracing::debug!(url = %config.database_url, "connected to database");

        let runner = Self {
            pool,
            ledger_table: config.ledger_table.clone(),
        };
        runner.ensure_version_table_exists().await?;
        Ok(runner)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Create the ledger table if it does not exist yet. Safe to call
    /// against an already-bootstrapped database.
    pub async fn ensure_version_table_exists(&self) -> MigrationResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version BIGINT NOT NULL PRIMARY KEY,\n    \
                applied_at TEXT NOT NULL\n\
            );",
            self.ledger_table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Applied revisions, ascending. Re-reads the ledger on every call.
    pub async fn get_applied_versions(&self) -> MigrationResult<Vec<Revision>> {
        let sql = format!(
            "SELECT version FROM {} ORDER BY version ASC",
            self.ledger_table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| Ok(Revision::new(row.try_get::<i64, _>("version")?)))
            .collect()
    }

    /// Full ledger rows with their apply timestamps, ascending by revision.
    pub async fn get_applied_records(&self) -> MigrationResult<Vec<AppliedMigration>> {
        let sql = format!(
            "SELECT version, applied_at FROM {} ORDER BY version ASC",
            self.ledger_table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let version: i64 = row.try_get("version")?;
            let applied_at: String = row.try_get("applied_at")?;
            let applied_at = DateTime::parse_from_rfc3339(&applied_at)?.with_timezone(&Utc);
            records.push(AppliedMigration {
                version: Revision::new(version),
                applied_at,
            });
        }
        Ok(records)
    }

    /// Durably record `revision` as applied, stamped with the current time.
    ///
    /// Recording an already-applied revision is a hard error; double
    /// recording would desynchronize the ledger from reality.
    pub async fn record_applied(&self, revision: Revision) -> MigrationResult<()> {
        let sql = format!(
            "INSERT INTO {} (version, applied_at) VALUES ($1, $2)",
            self.ledger_table
        );
        sqlx::query(&sql)
            .bind(revision.value())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => MigrationError::AlreadyRecorded(revision),
                _ => MigrationError::Database(e),
            })?;
        Ok(())
    }

    /// Remove the ledger row for `revision`.
    ///
    /// Removing an absent row does nothing; callers cannot use this to
    /// detect "was never applied".
    pub async fn record_unapplied(&self, revision: Revision) -> MigrationResult<()> {
        let sql = format!("DELETE FROM {} WHERE version = $1", self.ledger_table);
        let result = sqlx::query(&sql)
            .bind(revision.value())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            tracing::debug!(revision = %revision, "no ledger row to remove");
        }
        Ok(())
    }

    /// Apply `revision`: execute its up action, then record it.
    ///
    /// Fails with [`MigrationError::MigrationNotFound`] for an unknown
    /// revision and leaves the ledger untouched when the action fails.
    pub async fn apply(
        &self,
        registry: &MigrationRegistry,
        revision: Revision,
    ) -> MigrationResult<()> {
        let migration = registry
            .get(revision)
            .ok_or(MigrationError::MigrationNotFound(revision))?;
        let script = migration.up.as_ref().ok_or(MigrationError::ActionMissing {
            revision,
            direction: Direction::Up,
        })?;

        tracing::info!(revision = %revision, name = %migration.name, "applying migration");
        self.execute_script(revision, script).await?;
        self.record_applied(revision).await
    }

    /// Revert `revision`: execute its down action, then unrecord it.
    pub async fn revert(
        &self,
        registry: &MigrationRegistry,
        revision: Revision,
    ) -> MigrationResult<()> {
        let migration = registry
            .get(revision)
            .ok_or(MigrationError::MigrationNotFound(revision))?;
        let script = migration.down.as_ref().ok_or(MigrationError::ActionMissing {
            revision,
            direction: Direction::Down,
        })?;

        tracing::info!(revision = %revision, name = %migration.name, "reverting migration");
        self.execute_script(revision, script).await?;
        self.record_unapplied(revision).await
    }

    /// Run every statement of `script` inside one transaction.
    async fn execute_script(
        &self,
        revision: Revision,
        script: &MigrationScript,
    ) -> MigrationResult<()> {
        let mut transaction = self.pool.begin().await?;
        for statement in script.statements() {
            sqlx::query(&statement)
                .execute(&mut *transaction)
                .await
                .map_err(|source| MigrationError::Execution { revision, source })?;
        }
        transaction.commit().await?;
        Ok(())
    }

    /// Reconcile registry and ledger into one ascending status listing.
    ///
    /// Revisions present only in the ledger are surfaced as orphaned, never
    /// silently dropped.
    pub async fn status(&self, registry: &MigrationRegistry) -> MigrationResult<Vec<StatusEntry>> {
        let applied: BTreeMap<Revision, DateTime<Utc>> = self
            .get_applied_records()
            .await?
            .into_iter()
            .map(|record| (record.version, record.applied_at))
            .collect();

        let mut entries = Vec::new();
        for migration in registry.get_all() {
            let state = match applied.get(&migration.revision) {
                Some(&applied_at) => MigrationState::Applied { applied_at },
                None => MigrationState::Pending,
            };
            entries.push(StatusEntry {
                revision: migration.revision,
                name: Some(migration.name.clone()),
                state,
            });
        }
        for (revision, applied_at) in applied {
            if registry.get(revision).is_none() {
                entries.push(StatusEntry {
                    revision,
                    name: None,
                    state: MigrationState::Orphaned { applied_at },
                });
            }
        }
        entries.sort_by_key(|entry| entry.revision);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationScript;
    use tempfile::TempDir;

    fn sqlite_config(dir: &TempDir) -> MigrationConfig {
        MigrationConfig {
            database_url: format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("ledger.db").display()
            ),
            ..MigrationConfig::default()
        }
    }

    async fn runner(dir: &TempDir) -> MigrationRunner {
        MigrationRunner::connect(&sqlite_config(dir)).await.unwrap()
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        runner.record_applied(Revision::new(1)).await.unwrap();
        runner.ensure_version_table_exists().await.unwrap();

        // The existing ledger survives a repeated bootstrap.
        assert_eq!(
            runner.get_applied_versions().await.unwrap(),
            vec![Revision::new(1)]
        );
    }

    #[tokio::test]
    async fn record_and_unrecord_round_trip() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        runner.record_applied(Revision::new(42)).await.unwrap();
        assert!(runner
            .get_applied_versions()
            .await
            .unwrap()
            .contains(&Revision::new(42)));

        runner.record_unapplied(Revision::new(42)).await.unwrap();
        assert!(runner.get_applied_versions().await.unwrap().is_empty());

        // Removing an absent row is a no-op, not an error.
        runner.record_unapplied(Revision::new(42)).await.unwrap();
    }

    #[tokio::test]
    async fn double_record_is_a_hard_error() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        runner.record_applied(Revision::new(42)).await.unwrap();
        let err = runner.record_applied(Revision::new(42)).await.unwrap_err();
        assert!(matches!(err, MigrationError::AlreadyRecorded(r) if r == Revision::new(42)));
    }

    #[tokio::test]
    async fn applied_versions_come_back_ascending() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        for revision in [300, 100, 200] {
            runner.record_applied(Revision::new(revision)).await.unwrap();
        }
        let versions: Vec<i64> = runner
            .get_applied_versions()
            .await
            .unwrap()
            .iter()
            .map(|r| r.value())
            .collect();
        assert_eq!(versions, [100, 200, 300]);
    }

    #[tokio::test]
    async fn apply_unknown_revision_leaves_ledger_unchanged() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;
        let registry = MigrationRegistry::new();

        let err = runner.apply(&registry, Revision::new(7)).await.unwrap_err();
        assert!(matches!(err, MigrationError::MigrationNotFound(_)));
        assert!(runner.get_applied_versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_action_leaves_ledger_unchanged() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        let mut registry = MigrationRegistry::new();
        registry
            .register_up(
                Revision::new(1),
                "broken",
                MigrationScript::new("THIS IS NOT SQL;"),
            )
            .unwrap();

        let err = runner.apply(&registry, Revision::new(1)).await.unwrap_err();
        assert!(matches!(err, MigrationError::Execution { .. }));
        assert!(runner.get_applied_versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn revert_without_down_action_keeps_revision_applied() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        let mut registry = MigrationRegistry::new();
        registry
            .register_up(
                Revision::new(1),
                "one_way",
                MigrationScript::new("CREATE TABLE one_way (id INTEGER PRIMARY KEY);"),
            )
            .unwrap();
        runner.apply(&registry, Revision::new(1)).await.unwrap();

        let err = runner.revert(&registry, Revision::new(1)).await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::ActionMissing {
                direction: Direction::Down,
                ..
            }
        ));
        assert_eq!(
            runner.get_applied_versions().await.unwrap(),
            vec![Revision::new(1)]
        );
    }

    #[tokio::test]
    async fn status_surfaces_orphaned_revisions() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir).await;

        let mut registry = MigrationRegistry::new();
        registry
            .register_up(Revision::new(200), "known", MigrationScript::new("SELECT 1;"))
            .unwrap();
        runner.record_applied(Revision::new(100)).await.unwrap();

        let entries = runner.status(&registry).await.unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].revision, Revision::new(100));
        assert_eq!(entries[0].name, None);
        assert!(matches!(entries[0].state, MigrationState::Orphaned { .. }));

        assert_eq!(entries[1].revision, Revision::new(200));
        assert_eq!(entries[1].name.as_deref(), Some("known"));
        assert_eq!(entries[1].state, MigrationState::Pending);
    }
}
