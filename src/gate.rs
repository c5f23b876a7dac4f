//! Elapsed-time gate.
//!
//! Decides, from the last-started marker's mtime, whether enough time has
//! passed for a new run to be due. This check is only an optimization to
//! avoid needless lock attempts; the lock's atomic creation is the true
//! exclusion point.

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::GuardError;
use crate::fsmeta;

/// Decide whether the task is due to run.
///
/// A missing marker means the task has never run, which counts as due.
/// A zero `window` disables the check entirely, so every invocation is due.
/// Any other failure to stat the marker is a fatal configuration error.
pub fn is_due(marker: &Path, window: Duration, now: SystemTime) -> Result<bool, GuardError> {
    if window.is_zero() {
        return Ok(true);
    }
    match fsmeta::modified_within(marker, window, now) {
        Ok(within) => Ok(!within),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(GuardError::io("stat the last-started file", marker, e)),
    }
}
