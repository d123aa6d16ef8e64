//! `MigrationRecord` - one row of the ledger

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Represents a migration record in the ledger table.
///
/// Rows are written once by the runner and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub id: i64,
    /// Timestamp prefix of the identifier
    pub version: String,
    /// Class name suffix of the identifier
    pub class: String,
    pub group: String,
    pub namespace: String,
    /// When the migration was applied, in epoch seconds
    pub time: i64,
    /// Invocation that applied it
    pub batch: i32,
}

impl MigrationRecord {
    /// `version_class`, the identifier this record was written for.
    pub fn identifier(&self) -> String {
        format!("{}_{}", self.version, self.class_name())
    }

    /// Class without a namespace prefix. Existing ledgers may store the class
    /// namespaced, as in `App\Database\Migrations\CreatePostsTable`.
    pub fn class_name(&self) -> &str {
        self.class.rsplit('\\').next().unwrap_or(&self.class)
    }

    pub fn applied_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time, 0).single()
    }

    /// Create a `MigrationRecord` from a database row
    ///
    /// Expected column order: `id`, `version`, `class`, `group`, `namespace`, `time`, `batch`
    ///
    /// # Errors
    ///
    /// Returns `DbError::ParseError` if a column has an unexpected type.
    pub fn from_row(row: &may_postgres::Row) -> Result<Self, crate::DbError> {
        fn col<'a, T: may_postgres::types::FromSql<'a>>(
            row: &'a may_postgres::Row,
            idx: usize,
        ) -> Result<T, crate::DbError> {
            row.try_get(idx)
                .map_err(|e| crate::DbError::ParseError(format!("ledger column {idx}: {e}")))
        }

        Ok(Self {
            id: col(row, 0)?,
            version: col(row, 1)?,
            class: col(row, 2)?,
            group: col(row, 3)?,
            namespace: col(row, 4)?,
            time: col(row, 5)?,
            batch: col(row, 6)?,
        })
    }
}
