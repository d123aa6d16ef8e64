//! Migration infrastructure used by the install sequencer
//!
//! - [`Migration`] trait and validated [`MigrationId`]s
//! - [`MigrationRegistry`], the in-process [`MigrationCatalog`]
//! - [`SchemaManager`] for schema operations inside migrations
//! - the ledger table, its [`MigrationRecord`] rows and the [`MigrationRunner`]
//! - the [`InstallLock`] advisory lock
//!
//! # Example
//!
//! ```rust,no_run
//! use bedrock::migration::{Migration, MigrationRegistry, SchemaManager};
//! use bedrock::DbError;
//! use sea_query::{ColumnDef, Table};
//!
//! pub struct CreateTagsTable;
//!
//! impl Migration for CreateTagsTable {
//!     fn identifier(&self) -> &str {
//!         "2025-08-01-120000_CreateTagsTable"
//!     }
//!
//!     fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
//!         let table = Table::create()
//!             .table("tags")
//!             .col(ColumnDef::new("id").integer().not_null().auto_increment().primary_key())
//!             .col(ColumnDef::new("label").string_len(64).not_null())
//!             .to_owned();
//!         manager.create_table(table)
//!     }
//!
//!     fn down(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
//!         manager.drop_table(Table::drop().table("tags").to_owned())
//!     }
//! }
//!
//! let mut registry = MigrationRegistry::builtin().expect("builtin migrations are valid");
//! registry.register(CreateTagsTable).expect("unique identifier");
//! ```

pub mod identifier;
pub mod lock;
pub mod migration;
pub mod record;
pub mod registry;
pub mod runner;
pub mod schema_manager;
pub mod state_table;

pub use identifier::MigrationId;
pub use lock::{InstallLock, InstallLockGuard, PostgresAdvisoryLock};
pub use migration::{Migration, MigrationDefinition};
pub use record::MigrationRecord;
pub use registry::{MigrationCatalog, MigrationRegistry};
pub use runner::{MigrationRunner, PostgresMigrationRunner};
pub use schema_manager::SchemaManager;
