//! Migration status: which catalog definitions the ledger already records

use crate::migration::{MigrationDefinition, MigrationId, MigrationRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Migration status information
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    /// Ledger rows, in the order they were written
    pub applied: Vec<MigrationRecord>,

    /// Catalog definitions with no ledger row, in application order
    pub pending: Vec<MigrationId>,

    /// Ledger rows with no matching catalog definition
    pub unknown: Vec<String>,
}

impl MigrationStatus {
    /// Compare ledger rows against catalog definitions.
    #[must_use]
    pub fn new(applied: Vec<MigrationRecord>, definitions: &[MigrationDefinition]) -> Self {
        let recorded: BTreeSet<String> = applied.iter().map(|r| r.identifier()).collect();
        let known: BTreeSet<&str> = definitions.iter().map(|d| d.identifier()).collect();

        let pending = definitions
            .iter()
            .filter(|d| !recorded.contains(d.identifier()))
            .map(|d| d.id().clone())
            .collect();
        let unknown = applied
            .iter()
            .map(|r| r.identifier())
            .filter(|id| !known.contains(id.as_str()))
            .collect();

        Self {
            applied,
            pending,
            unknown,
        }
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// Highest batch number in the ledger
    #[must_use]
    pub fn latest_batch(&self) -> Option<i32> {
        self.applied.iter().map(|r| r.batch).max()
    }

    /// The definition the next install will apply first
    #[must_use]
    pub fn next_pending(&self) -> Option<&MigrationId> {
        self.pending.first()
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Applied: {}", self.applied.len())?;
        for record in &self.applied {
            let when = record
                .applied_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| record.time.to_string());
            writeln!(f, "  [batch {}] {} ({})", record.batch, record.identifier(), when)?;
        }

        writeln!(f, "Pending: {}", self.pending.len())?;
        for id in &self.pending {
            writeln!(f, "  {}", id)?;
        }

        if !self.unknown.is_empty() {
            writeln!(f, "Recorded without a definition: {}", self.unknown.join(", "))?;
        }

        if self.is_up_to_date() {
            write!(f, "Database is up to date")
        } else {
            write!(f, "{} migration(s) pending", self.pending.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationRegistry;
    use crate::migration::MigrationCatalog;

    fn record(id: i64, version: &str, class: &str, batch: i32) -> MigrationRecord {
        MigrationRecord {
            id,
            version: version.to_string(),
            class: class.to_string(),
            group: "default".to_string(),
            namespace: "App".to_string(),
            time: 1_752_987_953,
            batch,
        }
    }

    #[test]
    fn test_partial_ledger() {
        let definitions = MigrationRegistry::builtin().unwrap().list_definitions().unwrap();
        let applied = vec![record(1, "2025-07-20-050000", "CreateUsersTable", 1)];

        let status = MigrationStatus::new(applied, &definitions);

        assert!(!status.is_up_to_date());
        assert_eq!(status.latest_batch(), Some(1));
        assert_eq!(
            status.next_pending().map(|id| id.as_str()),
            Some("2025-07-20-050553_CreatePostsTable")
        );
        assert!(status.unknown.is_empty());
        assert!(status.to_string().ends_with("1 migration(s) pending"));
    }

    #[test]
    fn test_up_to_date_with_foreign_rows() {
        let definitions = MigrationRegistry::builtin().unwrap().list_definitions().unwrap();
        let applied = vec![
            record(1, "2025-07-20-050000", "CreateUsersTable", 1),
            record(2, "2025-07-20-050553", "CreatePostsTable", 1),
            record(3, "2024-01-01-000000", "LegacyTable", 2),
        ];

        let status = MigrationStatus::new(applied, &definitions);

        assert!(status.is_up_to_date());
        assert_eq!(status.unknown, vec!["2024-01-01-000000_LegacyTable"]);
        assert_eq!(status.latest_batch(), Some(2));
        assert!(status.to_string().contains("[batch 1] 2025-07-20-050000_CreateUsersTable"));
    }

    #[test]
    fn test_empty_ledger() {
        let status = MigrationStatus::new(Vec::new(), &[]);
        assert!(status.is_up_to_date());
        assert_eq!(status.latest_batch(), None);
        assert_eq!(status.to_string(), "Applied: 0\nPending: 0\nDatabase is up to date");
    }
}
