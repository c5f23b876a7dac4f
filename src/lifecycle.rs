//! Invocation lifecycle control.
//!
//! [`Guard::check_status`] is the single entry point a guarded task calls
//! at startup. It runs the elapsed-time gate, races for the exclusion
//! lock, and on contention runs the alert-throttling decision tree. No
//! helper terminates the process; every path returns a tagged outcome and
//! the caller (normally the CLI) maps it to an exit status at the top
//! level.

use std::fs;
use std::io;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{error, info, warn};

use crate::alert::{AlertSink, LogAlertSink, Suppressed, Throttle, Throttler};
use crate::config::GuardConfig;
use crate::error::{ExitStatus, GuardError};
use crate::fsmeta;
use crate::gate;
use crate::lock::{Acquire, LockDir};

/// Decision made by [`Guard::check_status`].
#[derive(Debug)]
pub enum CheckOutcome {
    /// The elapsed-time gate says it is too soon to run again. A normal,
    /// expected outcome, not a failure.
    NotDue,
    /// The lock is held elsewhere, or runs have been disabled.
    Contended(Contention),
    /// The lock was acquired and the last-started marker updated; the
    /// task body may run. Dropping the [`RunGuard`] releases the lock.
    Ready(RunGuard),
}

impl CheckOutcome {
    /// The exit status a scheduler should see for this outcome (for
    /// [`Ready`](CheckOutcome::Ready), assuming the task body succeeds).
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CheckOutcome::NotDue => ExitStatus::NoError,
            CheckOutcome::Contended(_) => ExitStatus::Contention,
            CheckOutcome::Ready(_) => ExitStatus::NoError,
        }
    }
}

/// Details of a contended invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contention {
    /// Runs were manually disabled (the disable semaphore was present).
    pub disabled: bool,
    /// An alert was delivered for this event (as opposed to throttled,
    /// silenced, or suppressed by configuration).
    pub alerted: bool,
}

/// Orchestrates the gate, the lock, and the alert throttler for one task
/// class.
pub struct Guard {
    config: GuardConfig,
    lock: LockDir,
    sink: Arc<dyn AlertSink>,
}

impl Guard {
    /// Guard with the default log-backed alert sink.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_alert_sink(config, Arc::new(LogAlertSink))
    }

    /// Guard with a caller-supplied alert sink.
    pub fn with_alert_sink(config: GuardConfig, sink: Arc<dyn AlertSink>) -> Self {
        let lock = LockDir::new(config.lock_dir.clone());
        Self { config, lock, sink }
    }

    /// The configuration this guard operates on.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Check whether the task should actually run, using the wall clock.
    pub fn check_status(&self) -> Result<CheckOutcome, GuardError> {
        self.check_status_at(SystemTime::now())
    }

    /// Check whether the task should actually run, as of `now`.
    ///
    /// The injectable clock exists for tests; production callers use
    /// [`check_status`](Guard::check_status).
    pub fn check_status_at(&self, now: SystemTime) -> Result<CheckOutcome, GuardError> {
        // The gate and the lock attempt are sequential, not atomic
        // together; two invocations can both pass the gate, and the lock
        // below is what actually excludes one of them.
        if self.config.run_every.is_zero() {
            info!("Interval checking has been disabled; continuing.");
        } else if gate::is_due(&self.config.last_started_file, self.config.run_every, now)? {
            info!("{} interval has expired; continuing.", self.config.task_title());
        } else {
            info!("{} interval has not expired; exiting.", self.config.task_title());
            return Ok(CheckOutcome::NotDue);
        }

        match self.lock.acquire()? {
            Acquire::Held => self.on_contention(now).map(CheckOutcome::Contended),
            Acquire::Acquired => self.on_acquired(now).map(CheckOutcome::Ready),
        }
    }

    /// Render the human-readable status report. Read-only; see
    /// [`status`](crate::status).
    pub fn render_status(&self, full: bool) -> String {
        crate::status::render_status(&self.config, full)
    }

    fn on_contention(&self, now: SystemTime) -> Result<Contention, GuardError> {
        let disabled = self.lock.is_disabled();
        let message = if disabled {
            format!("{} have been manually disabled; exiting.", self.config.tasks_title())
        } else {
            format!(
                "Could not create the lock directory\n(previous {} still running or failed?); exiting.",
                self.config.task_name
            )
        };
        error!("{message}");

        let alert_file = self.config.alert_path();
        let throttler = Throttler::new(&alert_file, self.config.realert_every);
        let decision = throttler.decide(disabled, self.lock.is_silenced(), now)?;

        let alerted = match decision {
            Throttle::FirstAlert | Throttle::ReAlert => {
                // A failed touch only degrades throttling, so warn and
                // still deliver the alert.
                if let Err(e) = fsmeta::touch(&alert_file, now) {
                    warn!(
                        "could not touch the alert file {}: {e}",
                        alert_file.display()
                    );
                }
                self.sink.send(&message);
                true
            }
            Throttle::Suppress(reason) => {
                match reason {
                    Suppressed::Disabled => {
                        error!("{} are disabled; no alert sent.", self.config.tasks_title())
                    }
                    Suppressed::ReAlertsOff => {
                        error!("Re-alerts are off by configuration; no alert sent.")
                    }
                    Suppressed::Silenced => error!("Alerts have been silenced; no alert sent."),
                    Suppressed::WithinWindow => {
                        error!("Alert interval has not expired; no alert sent.")
                    }
                }
                false
            }
        };

        Ok(Contention { disabled, alerted })
    }

    fn on_acquired(&self, now: SystemTime) -> Result<RunGuard, GuardError> {
        // From here on the lock is ours; on any error path below we must
        // release it ourselves, since no RunGuard exists yet.
        if let Err(err) = self.clear_stale_alert().and_then(|_| {
            fsmeta::touch(&self.config.last_started_file, now).map_err(|e| {
                GuardError::io(
                    "touch the last-started file",
                    &self.config.last_started_file,
                    e,
                )
            })
        }) {
            self.lock.release();
            return Err(err);
        }

        info!("Starting {}.", self.config.task_name);
        Ok(RunGuard {
            lock: self.lock.clone(),
            released: false,
        })
    }

    /// Remove an alert-throttle marker left over from a previous,
    /// partially-cleaned contention episode.
    fn clear_stale_alert(&self) -> Result<(), GuardError> {
        let alert_file = self.config.alert_path();
        match fs::remove_file(&alert_file) {
            Ok(()) => {
                info!("Lock directory created; cancelling previous alert status.");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GuardError::io("remove the alert file", alert_file, e)),
        }
    }
}

/// Releases the exclusion lock when dropped.
///
/// Dropping is best-effort and tolerates being skipped entirely: if the
/// process is killed without unwinding, the lock directory stays behind
/// and the next invocation reports contention, which is the designed
/// fallback signal. If runs were disabled while the task ran, release
/// leaves the directory in place.
#[derive(Debug)]
pub struct RunGuard {
    lock: LockDir,
    released: bool,
}

impl RunGuard {
    /// Path of the lock directory this guard holds.
    pub fn lock_path(&self) -> &std::path::Path {
        self.lock.path()
    }

    /// Release the lock now instead of at end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.lock.release();
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
