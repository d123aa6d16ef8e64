//! The install/bootstrap entry points.
//!
//! [`install`] connects with the configured URL, wires the PostgreSQL probe,
//! runner and advisory lock onto one connection, and runs the
//! [`InstallSequencer`]. It always returns a report; a database that cannot be
//! reached yields the connection-failure report with no steps.

pub mod probe;
pub mod report;
pub mod sequencer;
pub mod status;

pub use probe::{PostgresSchemaProbe, SchemaProbe};
pub use report::{InstallationReport, Outcome, StepOutcome, StepReport};
pub use sequencer::InstallSequencer;
pub use status::MigrationStatus;

use crate::config::{BedrockConfig, InstallSettings};
use crate::connection::{connect, redact_connection_string};
use crate::error::InstallError;
use crate::executor::{DbExecutor, PostgresExecutor};
use crate::migration::{
    MigrationCatalog, MigrationDefinition, MigrationId, MigrationRunner, PostgresAdvisoryLock,
    PostgresMigrationRunner,
};

/// Run the installer against the configured database.
pub fn install(config: &BedrockConfig, catalog: &dyn MigrationCatalog) -> InstallationReport {
    match connect(&config.database.url) {
        Ok(client) => {
            let executor = PostgresExecutor::new(client);
            install_with(&executor, &config.install, catalog)
        }
        Err(e) => {
            log::error!(
                "could not connect to {}: {}",
                redact_connection_string(&config.database.url),
                e
            );
            InstallSequencer::new(&Unreachable, catalog, &Unreachable, &config.install).run()
        }
    }
}

/// Run the installer over an existing connection.
pub fn install_with(
    executor: &dyn DbExecutor,
    settings: &InstallSettings,
    catalog: &dyn MigrationCatalog,
) -> InstallationReport {
    let probe = PostgresSchemaProbe::new(executor, settings);
    let runner = PostgresMigrationRunner::new(executor, settings);
    let lock = PostgresAdvisoryLock::new(executor, settings);

    let sequencer = InstallSequencer::new(&probe, catalog, &runner, settings);
    if settings.use_lock {
        sequencer.with_lock(&lock).run()
    } else {
        sequencer.run()
    }
}

/// Compare the configured database's ledger with `catalog`.
pub fn status(
    config: &BedrockConfig,
    catalog: &dyn MigrationCatalog,
) -> Result<MigrationStatus, InstallError> {
    let client = connect(&config.database.url)
        .map_err(|e| InstallError::Connectivity(e.to_string()))?;
    let executor = PostgresExecutor::new(client);
    status_with(&executor, &config.install, catalog)
}

/// [`status`] over an existing connection. A missing ledger reads as empty.
pub fn status_with(
    executor: &dyn DbExecutor,
    settings: &InstallSettings,
    catalog: &dyn MigrationCatalog,
) -> Result<MigrationStatus, InstallError> {
    let definitions = catalog.list_definitions()?;
    let probe = PostgresSchemaProbe::new(executor, settings);

    let applied = if probe.check_table(&settings.ledger_table)? {
        PostgresMigrationRunner::new(executor, settings).applied_records()?
    } else {
        Vec::new()
    };

    Ok(MigrationStatus::new(applied, &definitions))
}

/// Stand-in collaborator for a database that could not be reached at all.
struct Unreachable;

impl SchemaProbe for Unreachable {
    fn can_connect(&self) -> bool {
        false
    }

    fn table_exists(&self, _name: &str) -> bool {
        false
    }

    fn migration_applied(&self, _identifier: &MigrationId) -> bool {
        false
    }
}

impl MigrationRunner for Unreachable {
    fn ensure_ledger_exists(&self) -> Result<(), InstallError> {
        Err(InstallError::Connectivity("no connection".to_string()))
    }

    fn apply_pending(&self, _pending: &[MigrationDefinition]) -> Result<Vec<MigrationId>, InstallError> {
        Err(InstallError::Connectivity("no connection".to_string()))
    }
}
