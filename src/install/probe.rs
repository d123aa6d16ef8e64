//! SchemaProbe - yes/no questions about database state

use crate::config::InstallSettings;
use crate::executor::{DbError, DbExecutor};
use crate::migration::state_table::quote_ident;
use crate::migration::MigrationId;

/// Read-only questions the sequencer asks before acting.
///
/// Every answer is `false` when the question itself cannot be answered, so
/// probing a database that is not initialized yet is always safe. A caller
/// that needs to tell "no" from "could not check" re-probes `can_connect()`.
pub trait SchemaProbe {
    fn can_connect(&self) -> bool;

    fn table_exists(&self, name: &str) -> bool;

    /// Whether the ledger holds a row for `identifier`.
    fn migration_applied(&self, identifier: &MigrationId) -> bool;
}

/// [`SchemaProbe`] over a PostgreSQL connection.
pub struct PostgresSchemaProbe<'a> {
    executor: &'a dyn DbExecutor,
    settings: &'a InstallSettings,
}

impl<'a> PostgresSchemaProbe<'a> {
    pub fn new(executor: &'a dyn DbExecutor, settings: &'a InstallSettings) -> Self {
        Self { executor, settings }
    }

    pub fn check_connection(&self) -> Result<bool, DbError> {
        let row = self.executor.query_one("SELECT 1", &[])?;
        Ok(row.try_get::<_, i32>(0)? == 1)
    }

    pub fn check_table(&self, name: &str) -> Result<bool, DbError> {
        let row = self.executor.query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
            &[&name],
        )?;
        Ok(row.try_get::<_, bool>(0)?)
    }

    pub fn check_migration(&self, identifier: &MigrationId) -> Result<bool, DbError> {
        if !self.check_table(&self.settings.ledger_table)? {
            return Ok(false);
        }

        let sql = ledger_match_sql(&self.settings.ledger_table);
        let version = identifier.version();
        let class = identifier.class();
        let row = self.executor.query_one(&sql, &[&version, &class])?;
        Ok(row.try_get::<_, bool>(0)?)
    }
}

/// Ledger lookup by `(version, class)`. A class stored with a namespace
/// (`App\Database\Migrations\CreatePostsTable`) matches on its last segment.
pub(crate) fn ledger_match_sql(ledger_table: &str) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE version = $1 \
         AND (class = $2 OR right(class, char_length($2) + 1) = E'\\\\' || $2))",
        quote_ident(ledger_table)
    )
}

fn or_false(question: &str, answer: Result<bool, DbError>) -> bool {
    answer.unwrap_or_else(|e| {
        log::debug!("probe '{}' failed, treating as false: {}", question, e);
        false
    })
}

impl SchemaProbe for PostgresSchemaProbe<'_> {
    fn can_connect(&self) -> bool {
        or_false("can_connect", self.check_connection())
    }

    fn table_exists(&self, name: &str) -> bool {
        or_false("table_exists", self.check_table(name))
    }

    fn migration_applied(&self, identifier: &MigrationId) -> bool {
        or_false("migration_applied", self.check_migration(identifier))
    }
}
