//! Install-specific error types

use crate::executor::DbError;
use thiserror::Error;

/// Errors raised by the migration catalog, runner and lock.
///
/// The sequencer never propagates these; it folds each one into a step of the
/// installation report.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Database unreachable
    #[error("Database connection failed: {0}")]
    Connectivity(String),

    /// Bookkeeping table could not be created or read
    #[error("Ledger error: {0}")]
    Ledger(#[source] DbError),

    /// A specific migration's apply step failed
    #[error("Migration '{identifier}' failed during execution: {source}")]
    MigrationApply {
        identifier: String,
        #[source]
        source: DbError,
    },

    /// Required tables still missing after migrations ran
    #[error("Missing tables: {}", .missing.join(", "))]
    Verification { missing: Vec<String> },

    /// Another installer holds the install lock
    #[error(
        "Install lock timeout: {0}\n\
         Another process may be running the installer. If this persists, check for a stuck \
         installer session holding the advisory lock (pg_locks where locktype = 'advisory')."
    )]
    LockTimeout(String),

    /// Identifier does not follow `YYYY-MM-DD-HHMMSS_ClassName`
    #[error(
        "Invalid migration identifier '{0}': expected YYYY-MM-DD-HHMMSS_ClassName"
    )]
    InvalidIdentifier(String),

    /// Two definitions share an identifier
    #[error("Migration '{0}' is already registered")]
    AlreadyRegistered(String),

    /// Database execution error
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
