//! Migration trait definition

use super::identifier::MigrationId;
use super::schema_manager::SchemaManager;
use crate::executor::DbError;
use std::fmt;
use std::sync::Arc;

/// Trait that all migrations must implement
///
/// Each migration defines an `up()` that applies the schema change and a
/// `down()` that reverts it. Execution is synchronous; the `may` runtime
/// schedules the blocking database calls.
pub trait Migration: Send + Sync {
    /// Identifier in `YYYY-MM-DD-HHMMSS_ClassName` form
    fn identifier(&self) -> &str;

    /// Apply the migration (forward migration)
    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError>;

    /// Revert the migration
    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), DbError>;
}

/// A registered migration together with its validated identifier.
#[derive(Clone)]
pub struct MigrationDefinition {
    id: MigrationId,
    migration: Arc<dyn Migration>,
}

impl MigrationDefinition {
    pub(crate) fn new(id: MigrationId, migration: Arc<dyn Migration>) -> Self {
        Self { id, migration }
    }

    pub fn id(&self) -> &MigrationId {
        &self.id
    }

    pub fn identifier(&self) -> &str {
        self.id.as_str()
    }

    pub fn apply(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        self.migration.up(manager)
    }

    pub fn revert(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        self.migration.down(manager)
    }
}

impl fmt::Debug for MigrationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationDefinition")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
