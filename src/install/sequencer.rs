//! InstallSequencer - idempotent bootstrap state machine
//!
//! `Init → ProbingConnection → EnsuringLedger → ComputingPending →
//! ApplyingMigrations → VerifyingSchema → Done`
//!
//! Every decision is re-derived from the database on each run; there is no
//! "installed" flag. A finished installation therefore converges to a run made
//! only of `Success` and `Skipped` steps.

use super::probe::SchemaProbe;
use super::report::{InstallationReport, Outcome, ReportBuilder, StepOutcome};
use crate::config::InstallSettings;
use crate::error::InstallError;
use crate::migration::{
    InstallLock, InstallLockGuard, MigrationCatalog, MigrationDefinition, MigrationRunner,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub const CONNECTION_FAILED_SUMMARY: &str = "Database connection failed. Please check the database \
     settings (database.url or BEDROCK__DATABASE__URL).";
pub const SUCCESS_SUMMARY: &str = "Installation completed successfully! Your API is ready to use.";
pub const ERROR_SUMMARY: &str =
    "Installation completed with some errors. Please check the details above.";

const LOCK_STEP: &str = "Acquiring install lock";
const LEDGER_STEP: &str = "Checking migrations table";
const MIGRATIONS_STEP: &str = "Checking migrations";
const RUN_STEP: &str = "Running pending migrations";
const CATALOG_STEP: &str = "Running migrations";
const VERIFY_STEP: &str = "Verifying database tables";
const ABORT_STEP: &str = "Installation aborted";

#[derive(Debug, Clone, Copy)]
enum State {
    ProbingConnection,
    EnsuringLedger,
    ComputingPending,
    ApplyingMigrations,
    VerifyingSchema,
}

impl State {
    fn as_str(self) -> &'static str {
        match self {
            State::ProbingConnection => "probing_connection",
            State::EnsuringLedger => "ensuring_ledger",
            State::ComputingPending => "computing_pending",
            State::ApplyingMigrations => "applying_migrations",
            State::VerifyingSchema => "verifying_schema",
        }
    }
}

#[cfg(feature = "tracing")]
fn enter(state: State) -> tracing::span::EnteredSpan {
    log::debug!("install state: {}", state.as_str());
    crate::metrics::tracing_helpers::install_step_span(state.as_str()).entered()
}

#[cfg(not(feature = "tracing"))]
fn enter(state: State) {
    log::debug!("install state: {}", state.as_str());
}

/// How the drive loop stopped.
enum Done {
    ConnectionFailed,
    Finished,
}

enum Pending {
    EmptyCatalog,
    Ready(Vec<MigrationDefinition>),
    Failed,
}

/// Orchestrates probe, catalog, runner and (optionally) a lock into one
/// re-runnable bootstrap that always yields a complete report.
pub struct InstallSequencer<'a> {
    probe: &'a dyn SchemaProbe,
    catalog: &'a dyn MigrationCatalog,
    runner: &'a dyn MigrationRunner,
    lock: Option<&'a dyn InstallLock>,
    settings: &'a InstallSettings,
}

impl<'a> InstallSequencer<'a> {
    pub fn new(
        probe: &'a dyn SchemaProbe,
        catalog: &'a dyn MigrationCatalog,
        runner: &'a dyn MigrationRunner,
        settings: &'a InstallSettings,
    ) -> Self {
        Self {
            probe,
            catalog,
            runner,
            lock: None,
            settings,
        }
    }

    /// Hold `lock` from the ledger step through migration application.
    pub fn with_lock(mut self, lock: &'a dyn InstallLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Run the whole sequence once. Never panics and never returns an error;
    /// failures are steps of the report.
    pub fn run(&self) -> InstallationReport {
        let mut builder = ReportBuilder::new();
        let done = panic::catch_unwind(AssertUnwindSafe(|| self.drive(&mut builder)));

        let report = match done {
            Ok(Done::ConnectionFailed) => {
                log::error!("{}", CONNECTION_FAILED_SUMMARY);
                builder.finish(Outcome::Error, CONNECTION_FAILED_SUMMARY)
            }
            Ok(Done::Finished) if !builder.has_error() => {
                builder.finish(Outcome::Success, SUCCESS_SUMMARY)
            }
            Ok(Done::Finished) => builder.finish(Outcome::Error, ERROR_SUMMARY),
            Err(payload) => {
                builder.push(
                    ABORT_STEP,
                    StepOutcome::Error,
                    format!("Installation failed: {}", panic_message(payload.as_ref())),
                );
                builder.finish(Outcome::Error, ERROR_SUMMARY)
            }
        };

        #[cfg(feature = "metrics")]
        crate::metrics::METRICS.record_install(report.overall.as_str());

        log::info!("install finished: {}", report.overall.as_str());
        report
    }

    fn drive(&self, report: &mut ReportBuilder) -> Done {
        {
            let _state = enter(State::ProbingConnection);
            if !self.probe.can_connect() {
                return Done::ConnectionFailed;
            }
        }

        {
            let _guard = match self.lock.map(InstallLockGuard::acquire).transpose() {
                Ok(guard) => guard,
                Err(e) => {
                    report.push(LOCK_STEP, StepOutcome::Error, e.to_string());
                    return Done::Finished;
                }
            };

            if !self.ensure_ledger(report) {
                return Done::Finished;
            }

            match self.compute_pending(report) {
                Pending::Failed => return Done::Finished,
                Pending::EmptyCatalog => {}
                Pending::Ready(pending) => {
                    if !self.apply(report, &pending) {
                        return Done::Finished;
                    }
                }
            }
        }

        self.verify(report);
        Done::Finished
    }

    fn ensure_ledger(&self, report: &mut ReportBuilder) -> bool {
        let _state = enter(State::EnsuringLedger);
        let slot = report.begin(LEDGER_STEP, "Verifying migrations table exists...");

        if self.probe.table_exists(&self.settings.ledger_table) {
            report.finalize(slot, StepOutcome::Success, "Migrations table already exists");
            return true;
        }

        match self.runner.ensure_ledger_exists() {
            Ok(()) => {
                report.finalize(slot, StepOutcome::Success, "Migrations table created successfully");
                true
            }
            Err(e) => {
                report.finalize(
                    slot,
                    StepOutcome::Error,
                    format!("Failed to create migrations table: {}", ledger_cause(&e)),
                );
                false
            }
        }
    }

    fn compute_pending(&self, report: &mut ReportBuilder) -> Pending {
        let _state = enter(State::ComputingPending);

        let definitions = match self.catalog.list_definitions() {
            Ok(definitions) => definitions,
            Err(e) => {
                report.push(CATALOG_STEP, StepOutcome::Error, format!("Failed to run migrations: {}", e));
                return Pending::Failed;
            }
        };

        if definitions.is_empty() {
            report.push(MIGRATIONS_STEP, StepOutcome::Info, "No migration files found");
            return Pending::EmptyCatalog;
        }

        let mut pending = Vec::new();
        for definition in definitions {
            if self.probe.migration_applied(definition.id()) {
                report.push(
                    &format!("Checking migration: {}", definition.id()),
                    StepOutcome::Skipped,
                    format!("Migration {} already run, skipping", definition.id()),
                );
            } else {
                pending.push(definition);
            }
        }

        Pending::Ready(pending)
    }

    fn apply(&self, report: &mut ReportBuilder, pending: &[MigrationDefinition]) -> bool {
        let _state = enter(State::ApplyingMigrations);

        if pending.is_empty() {
            report.push(MIGRATIONS_STEP, StepOutcome::Success, "All migrations are up to date");
            return true;
        }

        let slot = report.begin(
            RUN_STEP,
            format!("Executing {} pending migration(s)...", pending.len()),
        );

        match self.runner.apply_pending(pending) {
            Ok(applied) => {
                let names: Vec<&str> = applied.iter().map(|id| id.as_str()).collect();
                report.finalize(
                    slot,
                    StepOutcome::Success,
                    format!("All pending migrations completed successfully: {}", names.join(", ")),
                );
                true
            }
            Err(e) => {
                report.finalize(slot, StepOutcome::Error, format!("Migration failed: {}", e));
                false
            }
        }
    }

    fn verify(&self, report: &mut ReportBuilder) {
        let _state = enter(State::VerifyingSchema);

        let required = &self.settings.required_tables;
        if required.is_empty() {
            report.push(VERIFY_STEP, StepOutcome::Success, "No required tables configured");
            return;
        }

        let (present, missing): (Vec<&String>, Vec<&String>) =
            required.iter().partition(|table| self.probe.table_exists(table));

        if missing.is_empty() {
            let present: Vec<&str> = present.iter().map(|t| t.as_str()).collect();
            report.push(
                VERIFY_STEP,
                StepOutcome::Success,
                format!("All required tables exist: {}", present.join(", ")),
            );
        } else {
            let err = InstallError::Verification {
                missing: missing.into_iter().cloned().collect(),
            };
            report.push(VERIFY_STEP, StepOutcome::Error, err.to_string());
        }
    }
}

/// The underlying database message, without the variant prefix.
fn ledger_cause(err: &InstallError) -> String {
    match err {
        InstallError::Ledger(source) => source.to_string(),
        other => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
