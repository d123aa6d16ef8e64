//! Migration catalog and the in-process registry that backs it

use super::identifier::MigrationId;
use super::migration::{Migration, MigrationDefinition};
use crate::error::InstallError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Source of available migration definitions.
pub trait MigrationCatalog {
    /// All known definitions, ascending by identifier. May be empty.
    fn list_definitions(&self) -> Result<Vec<MigrationDefinition>, InstallError>;
}

/// Owned registry of migrations, keyed and ordered by identifier.
///
/// Built once at startup and handed to the sequencer by reference; there is
/// no process-global registry.
#[derive(Default, Clone)]
pub struct MigrationRegistry {
    migrations: BTreeMap<MigrationId, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::InvalidIdentifier` if the identifier is malformed
    /// and `InstallError::AlreadyRegistered` if it is already taken.
    pub fn register(&mut self, migration: impl Migration + 'static) -> Result<(), InstallError> {
        self.register_arc(Arc::new(migration))
    }

    pub fn register_arc(&mut self, migration: Arc<dyn Migration>) -> Result<(), InstallError> {
        let id = MigrationId::parse(migration.identifier())?;
        if self.migrations.contains_key(&id) {
            return Err(InstallError::AlreadyRegistered(id.to_string()));
        }

        log::debug!("registered migration {}", id);
        self.migrations.insert(id, migration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl MigrationCatalog for MigrationRegistry {
    fn list_definitions(&self) -> Result<Vec<MigrationDefinition>, InstallError> {
        Ok(self
            .migrations
            .iter()
            .map(|(id, migration)| MigrationDefinition::new(id.clone(), Arc::clone(migration)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::DbError;
    use crate::migration::SchemaManager;

    struct Named(&'static str);

    impl Migration for Named {
        fn identifier(&self) -> &str {
            self.0
        }

        fn up(&self, _manager: &SchemaManager<'_>) -> Result<(), DbError> {
            Ok(())
        }

        fn down(&self, _manager: &SchemaManager<'_>) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[test]
    fn test_definitions_sorted_regardless_of_registration_order() {
        let mut registry = MigrationRegistry::new();
        registry.register(Named("2025-02-01-000000_B")).unwrap();
        registry.register(Named("2025-01-01-000000_A")).unwrap();
        registry.register(Named("2025-03-01-000000_C")).unwrap();

        let ids: Vec<String> = registry
            .list_definitions()
            .unwrap()
            .iter()
            .map(|d| d.identifier().to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["2025-01-01-000000_A", "2025-02-01-000000_B", "2025-03-01-000000_C"]
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = MigrationRegistry::new();
        registry.register(Named("2025-01-01-000000_A")).unwrap();
        let err = registry.register(Named("2025-01-01-000000_A")).unwrap_err();
        assert!(matches!(err, InstallError::AlreadyRegistered(id) if id == "2025-01-01-000000_A"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_malformed_identifier_rejected() {
        let mut registry = MigrationRegistry::new();
        let err = registry.register(Named("create_users")).unwrap_err();
        assert!(matches!(err, InstallError::InvalidIdentifier(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_registry_lists_nothing() {
        assert!(MigrationRegistry::new().list_definitions().unwrap().is_empty());
    }
}
