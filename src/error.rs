//! Crate-level error types and exit-status mapping.
//!
//! Helpers never terminate the process themselves; they return errors (or
//! tagged outcomes) up to the binary, which performs the single
//! `std::process::exit`-equivalent at the top level.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Exit statuses surfaced to the invoking scheduler.
///
/// Each is a distinct integer so scheduler-level monitoring can distinguish
/// "ran/skipped", "broken setup", and "previous run still active" without
/// parsing log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Ran to completion, or skipped because the interval has not elapsed.
    NoError,
    /// Configuration or filesystem fault; the run never started.
    Startup,
    /// The lock was already held: a previous run is still active (or
    /// crashed), or runs have been manually disabled.
    Contention,
}

impl ExitStatus {
    /// The process exit code for this status.
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::NoError => 0,
            ExitStatus::Startup => 10,
            ExitStatus::Contention => 11,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Errors that can occur while operating the guard.
///
/// All variants are fatal startup conditions: the exclusive-execution
/// invariant cannot be guaranteed if the filesystem itself is unreliable, so
/// no partial recovery is attempted. Expected conditions (lock already held,
/// marker already absent) are not errors and are modeled as outcomes instead.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A filesystem operation failed for a reason other than an expected
    /// "already exists" / "does not exist" condition.
    #[error("could not {verb} {path}: {source}")]
    Io {
        /// What was being attempted, e.g. "create the lock directory".
        verb: &'static str,
        /// The path the operation targeted.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GuardError {
    /// Build an I/O variant without spelling out the struct fields.
    pub fn io(verb: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GuardError::Io {
            verb,
            path: path.into(),
            source,
        }
    }

    /// The exit status a scheduler should see for this error.
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::Startup
    }
}
