//! Migration identifiers: `YYYY-MM-DD-HHMMSS_ClassName`

use crate::error::InstallError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}-\d{6})_([A-Za-z][A-Za-z0-9_]*)$")
        .expect("identifier pattern is valid")
});

/// Validated migration identifier.
///
/// Ordering is lexicographic on the full identifier, which for this format is
/// chronological on the version prefix.
///
/// # Example
/// - `2025-07-20-050553_CreatePostsTable` → version `2025-07-20-050553`, class `CreatePostsTable`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationId {
    full: String,
    split: usize,
}

impl MigrationId {
    pub fn parse(identifier: &str) -> Result<Self, InstallError> {
        let caps = IDENTIFIER_PATTERN
            .captures(identifier)
            .ok_or_else(|| InstallError::InvalidIdentifier(identifier.to_string()))?;
        let split = caps
            .get(1)
            .map(|m| m.end())
            .ok_or_else(|| InstallError::InvalidIdentifier(identifier.to_string()))?;

        Ok(Self {
            full: identifier.to_string(),
            split,
        })
    }

    /// Timestamp prefix, stored in the ledger's `version` column.
    pub fn version(&self) -> &str {
        &self.full[..self.split]
    }

    /// Class name suffix, stored in the ledger's `class` column.
    pub fn class(&self) -> &str {
        &self.full[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
