//! Advisory lock serializing concurrent installer runs

use crate::config::InstallSettings;
use crate::error::InstallError;
use crate::executor::DbExecutor;
use std::time::{Duration, Instant};

/// Mutual exclusion between installer invocations.
pub trait InstallLock {
    /// Block until the lock is held or the implementation gives up.
    fn acquire(&self) -> Result<(), InstallError>;

    fn release(&self) -> Result<(), InstallError>;
}

/// Guard that releases the lock when dropped, including on early return.
pub struct InstallLockGuard<'a> {
    lock: &'a dyn InstallLock,
}

impl<'a> InstallLockGuard<'a> {
    pub fn acquire(lock: &'a dyn InstallLock) -> Result<Self, InstallError> {
        lock.acquire()?;
        Ok(Self { lock })
    }
}

impl Drop for InstallLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release() {
            log::warn!("failed to release install lock: {}", e);
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// PostgreSQL session-level advisory lock (`pg_try_advisory_lock`).
///
/// Held by the connection that acquired it, so the probe, runner and lock must
/// share one executor for the lock to cover the ledger writes.
pub struct PostgresAdvisoryLock<'a> {
    executor: &'a dyn DbExecutor,
    key: i64,
    timeout: Duration,
}

impl<'a> PostgresAdvisoryLock<'a> {
    pub fn new(executor: &'a dyn DbExecutor, settings: &InstallSettings) -> Self {
        Self {
            executor,
            key: settings.lock_key,
            timeout: Duration::from_secs(settings.lock_timeout_seconds),
        }
    }

    fn try_acquire(&self) -> Result<bool, InstallError> {
        let row = self
            .executor
            .query_one("SELECT pg_try_advisory_lock($1)", &[&self.key])?;
        row.try_get::<_, bool>(0)
            .map_err(|e| InstallError::Database(e.into()))
    }
}

impl InstallLock for PostgresAdvisoryLock<'_> {
    fn acquire(&self) -> Result<(), InstallError> {
        let start = Instant::now();
        loop {
            if self.try_acquire()? {
                log::debug!("install lock {} acquired after {:?}", self.key, start.elapsed());
                return Ok(());
            }

            // Check the overall timeout after each attempt so a zero timeout still tries once
            if start.elapsed() >= self.timeout {
                return Err(InstallError::LockTimeout(format!(
                    "could not acquire advisory lock {} within {} seconds",
                    self.key,
                    self.timeout.as_secs()
                )));
            }

            may::coroutine::sleep(POLL_INTERVAL);
        }
    }

    fn release(&self) -> Result<(), InstallError> {
        self.executor
            .query_one("SELECT pg_advisory_unlock($1)", &[&self.key])?;
        Ok(())
    }
}
