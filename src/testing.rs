//! In-memory doubles for unit tests.

use crate::error::InstallError;
use crate::executor::{DbError, DbExecutor};
use crate::install::SchemaProbe;
use crate::migration::{
    Migration, MigrationDefinition, MigrationId, MigrationRunner, SchemaManager,
};
use may_postgres::types::ToSql;
use may_postgres::Row;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Executor that records every statement and never returns rows.
#[derive(Default)]
pub struct RecordingExecutor {
    statements: RefCell<Vec<String>>,
    queries: RefCell<Vec<String>>,
    fail_all: Option<String>,
    fail_on: Option<(String, String)>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Statements starting with `prefix` fail with `message`.
    pub fn failing_on(prefix: &str, message: &str) -> Self {
        Self {
            fail_on: Some((prefix.to_string(), message.to_string())),
            ..Self::default()
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl DbExecutor for RecordingExecutor {
    fn execute(&self, query: &str, _params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.statements.borrow_mut().push(query.to_string());
        if let Some(message) = &self.fail_all {
            return Err(DbError::QueryError(message.clone()));
        }
        if let Some((prefix, message)) = &self.fail_on {
            if query.starts_with(prefix.as_str()) {
                return Err(DbError::QueryError(message.clone()));
            }
        }
        Ok(0)
    }

    fn query_one(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Row, DbError> {
        self.queries.borrow_mut().push(query.to_string());
        Err(self.no_rows())
    }

    fn query_all(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        self.queries.borrow_mut().push(query.to_string());
        Err(self.no_rows())
    }
}

impl RecordingExecutor {
    fn no_rows(&self) -> DbError {
        match &self.fail_all {
            Some(message) => DbError::QueryError(message.clone()),
            None => DbError::QueryError("recording executor returns no rows".to_string()),
        }
    }
}

/// Database state shared between [`MemoryDatabase`] and its [`ScriptedMigration`]s.
#[derive(Debug, Default)]
pub struct MemoryState {
    pub connected: bool,
    pub tables: BTreeSet<String>,
    pub ledger: Vec<String>,
    /// Every `up()` invocation, in call order
    pub applied_order: Vec<String>,
    pub fail_ledger_creation: Option<String>,
    pub calls: Vec<&'static str>,
}

/// Fake database implementing [`SchemaProbe`] and [`MigrationRunner`].
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    ledger_table: String,
    executor: RecordingExecutor,
}

impl MemoryDatabase {
    /// Reachable, empty database.
    pub fn new() -> Self {
        let state = MemoryState {
            connected: true,
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            ledger_table: "migrations".to_string(),
            executor: RecordingExecutor::new(),
        }
    }

    pub fn unreachable() -> Self {
        let db = Self::new();
        db.state().connected = false;
        db
    }

    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    /// Migration whose `up()` creates `tables` in this database.
    pub fn migration(&self, id: &'static str, tables: &[&str]) -> ScriptedMigration {
        ScriptedMigration {
            id,
            creates: tables.iter().map(|t| t.to_string()).collect(),
            fails_with: None,
            state: Arc::clone(&self.state),
        }
    }

    /// Migration whose `up()` fails with `message`.
    pub fn failing_migration(&self, id: &'static str, message: &str) -> ScriptedMigration {
        ScriptedMigration {
            id,
            creates: Vec::new(),
            fails_with: Some(message.to_string()),
            state: Arc::clone(&self.state),
        }
    }
}

impl SchemaProbe for MemoryDatabase {
    fn can_connect(&self) -> bool {
        let mut state = self.state();
        state.calls.push("can_connect");
        state.connected
    }

    fn table_exists(&self, name: &str) -> bool {
        let mut state = self.state();
        state.calls.push("table_exists");
        state.connected && state.tables.contains(name)
    }

    fn migration_applied(&self, identifier: &MigrationId) -> bool {
        let mut state = self.state();
        state.calls.push("migration_applied");
        state.ledger.iter().any(|id| id == identifier.as_str())
    }
}

impl MigrationRunner for MemoryDatabase {
    fn ensure_ledger_exists(&self) -> Result<(), InstallError> {
        let mut state = self.state();
        state.calls.push("ensure_ledger_exists");
        if let Some(message) = state.fail_ledger_creation.clone() {
            return Err(InstallError::Ledger(DbError::QueryError(message)));
        }
        state.tables.insert(self.ledger_table.clone());
        Ok(())
    }

    fn apply_pending(&self, pending: &[MigrationDefinition]) -> Result<Vec<MigrationId>, InstallError> {
        self.state().calls.push("apply_pending");

        let mut applied = Vec::new();
        for definition in pending {
            // state lock must not be held here: migrations take it themselves
            let manager = SchemaManager::new(&self.executor);
            definition
                .apply(&manager)
                .map_err(|source| InstallError::MigrationApply {
                    identifier: definition.identifier().to_string(),
                    source,
                })?;
            self.state().ledger.push(definition.identifier().to_string());
            applied.push(definition.id().clone());
        }
        Ok(applied)
    }
}

pub struct ScriptedMigration {
    id: &'static str,
    creates: Vec<String>,
    fails_with: Option<String>,
    state: Arc<Mutex<MemoryState>>,
}

impl Migration for ScriptedMigration {
    fn identifier(&self) -> &str {
        self.id
    }

    fn up(&self, _manager: &SchemaManager<'_>) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state.applied_order.push(self.id.to_string());
        if let Some(message) = &self.fails_with {
            return Err(DbError::QueryError(message.clone()));
        }
        state.tables.extend(self.creates.iter().cloned());
        Ok(())
    }

    fn down(&self, _manager: &SchemaManager<'_>) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        for table in &self.creates {
            state.tables.remove(table);
        }
        Ok(())
    }
}
