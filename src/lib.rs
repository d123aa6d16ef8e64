//! # Bedrock
//!
//! Idempotent install/bootstrap sequencer for PostgreSQL on the `may` runtime.
//!
//! A run probes the database, creates the migration ledger when missing,
//! applies pending migrations in identifier order and verifies the required
//! tables, producing an [`InstallationReport`] of every step. Running it again
//! against an installed database changes nothing.
//!
//! ```no_run
//! use bedrock::{install, BedrockConfig, MigrationRegistry};
//!
//! let config = BedrockConfig::load()?;
//! let catalog = MigrationRegistry::builtin()?;
//! let report = install(&config, &catalog);
//! println!("{report}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod install;
pub mod metrics;
pub mod migration;
pub mod schema;
pub mod server;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::{BedrockConfig, DatabaseConfig, InstallSettings, ServerConfig};
pub use connection::{connect, ConnectionError};
pub use error::InstallError;
pub use executor::{DbError, DbExecutor, PostgresExecutor};
pub use install::{
    install, install_with, status, status_with, InstallSequencer, InstallationReport,
    MigrationStatus, Outcome, SchemaProbe, StepOutcome, StepReport,
};
pub use migration::{Migration, MigrationCatalog, MigrationId, MigrationRegistry, MigrationRunner};
