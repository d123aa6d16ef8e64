//! MigrationRunner - the only writer of the ledger

use super::identifier::MigrationId;
use super::migration::MigrationDefinition;
use super::record::MigrationRecord;
use super::schema_manager::SchemaManager;
use super::state_table::{create_ledger_table_sql, quote_ident};
use crate::config::InstallSettings;
use crate::error::InstallError;
use crate::executor::{DbError, DbExecutor};
use chrono::Utc;
use std::time::Instant;

/// Applies migration definitions and records them in the ledger.
pub trait MigrationRunner {
    /// Create the ledger table if absent. Calling it when the table exists is a no-op.
    fn ensure_ledger_exists(&self) -> Result<(), InstallError>;

    /// Apply `pending` in order as one batch.
    ///
    /// Stops at the first definition that fails. Definitions applied before
    /// the failure stay committed and are skipped on the next run; the failed
    /// one has no ledger row and is retried.
    fn apply_pending(&self, pending: &[MigrationDefinition]) -> Result<Vec<MigrationId>, InstallError>;
}

/// [`MigrationRunner`] writing to a PostgreSQL ledger.
pub struct PostgresMigrationRunner<'a> {
    executor: &'a dyn DbExecutor,
    settings: &'a InstallSettings,
}

impl<'a> PostgresMigrationRunner<'a> {
    pub fn new(executor: &'a dyn DbExecutor, settings: &'a InstallSettings) -> Self {
        Self { executor, settings }
    }

    /// Ledger rows in the order they were written.
    pub fn applied_records(&self) -> Result<Vec<MigrationRecord>, InstallError> {
        let sql = format!(
            r#"SELECT id, version, class, "group", namespace, time, batch FROM {} ORDER BY id ASC"#,
            quote_ident(&self.settings.ledger_table)
        );

        let rows = self.executor.query_all(&sql, &[]).map_err(InstallError::Ledger)?;
        rows.iter()
            .map(|row| MigrationRecord::from_row(row).map_err(InstallError::Ledger))
            .collect()
    }

    /// Batch number for this invocation: one past the highest recorded batch.
    fn next_batch(&self) -> Result<i32, InstallError> {
        let sql = format!(
            "SELECT COALESCE(MAX(batch), 0) + 1 FROM {}",
            quote_ident(&self.settings.ledger_table)
        );
        let row = self.executor.query_one(&sql, &[]).map_err(InstallError::Ledger)?;
        row.try_get::<_, i32>(0)
            .map_err(|e| InstallError::Ledger(e.into()))
    }

    pub(crate) fn apply_batch(
        &self,
        pending: &[MigrationDefinition],
        batch: i32,
    ) -> Result<Vec<MigrationId>, InstallError> {
        let mut applied = Vec::with_capacity(pending.len());
        for definition in pending {
            let start = Instant::now();
            self.apply_one(definition, batch)?;
            log::info!(
                "applied migration {} (batch {}) in {}ms",
                definition.id(),
                batch,
                start.elapsed().as_millis()
            );
            applied.push(definition.id().clone());
        }
        Ok(applied)
    }

    /// Run one definition and write its ledger row inside a single transaction.
    fn apply_one(&self, definition: &MigrationDefinition, batch: i32) -> Result<(), InstallError> {
        let failed = |source| InstallError::MigrationApply {
            identifier: definition.identifier().to_string(),
            source,
        };

        let tx = Transaction::begin(self.executor).map_err(failed)?;

        let manager = SchemaManager::new(self.executor);
        let result = definition
            .apply(&manager)
            .and_then(|()| self.record(definition.id(), batch));

        match result {
            Ok(()) => tx.commit().map_err(failed),
            Err(source) => {
                if let Err(e) = tx.rollback() {
                    log::warn!("rollback after failed migration {} also failed: {}", definition.id(), e);
                }
                Err(failed(source))
            }
        }
    }

    fn record(&self, id: &MigrationId, batch: i32) -> Result<(), DbError> {
        let sql = format!(
            r#"INSERT INTO {} (version, class, "group", namespace, time, batch) VALUES ($1, $2, $3, $4, $5, $6)"#,
            quote_ident(&self.settings.ledger_table)
        );
        let version = id.version().to_string();
        let class = id.class().to_string();
        let time = Utc::now().timestamp();

        self.executor
            .execute(
                &sql,
                &[
                    &version,
                    &class,
                    &self.settings.group,
                    &self.settings.namespace,
                    &time,
                    &batch,
                ],
            )
            .map(|_| ())
    }
}

/// Transaction on the runner's session. Rolled back on drop unless it was
/// committed or rolled back explicitly, including while a migration unwinds.
struct Transaction<'a> {
    executor: &'a dyn DbExecutor,
    open: bool,
}

impl<'a> Transaction<'a> {
    fn begin(executor: &'a dyn DbExecutor) -> Result<Self, DbError> {
        executor.execute("BEGIN", &[])?;
        Ok(Self { executor, open: true })
    }

    fn commit(mut self) -> Result<(), DbError> {
        self.open = false;
        self.executor.execute("COMMIT", &[]).map(|_| ())
    }

    fn rollback(mut self) -> Result<(), DbError> {
        self.open = false;
        self.executor.execute("ROLLBACK", &[]).map(|_| ())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.executor.execute("ROLLBACK", &[]) {
                log::warn!("rollback of abandoned migration transaction failed: {}", e);
            }
        }
    }
}

impl MigrationRunner for PostgresMigrationRunner<'_> {
    fn ensure_ledger_exists(&self) -> Result<(), InstallError> {
        let sql = create_ledger_table_sql(&self.settings.ledger_table);
        self.executor.execute(&sql, &[]).map_err(InstallError::Ledger)?;
        log::debug!("ledger table {} ensured", self.settings.ledger_table);
        Ok(())
    }

    fn apply_pending(&self, pending: &[MigrationDefinition]) -> Result<Vec<MigrationId>, InstallError> {
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let batch = self.next_batch()?;
        let applied = self.apply_batch(pending, batch)?;

        #[cfg(feature = "metrics")]
        crate::metrics::METRICS.record_migrations_applied(applied.len());

        Ok(applied)
    }
}
