//! Exclusion lock directory and its semaphore files.
//!
//! The lock is a directory created with an atomic create-exclusive
//! operation; its presence means a run is active or crashed without
//! cleanup. The two distinctions cannot be told apart automatically, and
//! that is deliberate: an operator resolves the ambiguity with the status
//! report and the clear-lock command.
//!
//! Semaphore files live inside the lock directory, so their lifetime is
//! bounded by the lock's: removing the lock clears them too.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::GuardError;

/// Semaphore file meaning "leave the lock in place on release, blocking
/// all future runs until re-enabled".
pub const DISABLED_SEMAPHORE: &str = "script_disabled";

/// Semaphore file meaning "do not send lock-contention alerts".
pub const SILENCED_SEMAPHORE: &str = "lf_alerts_silenced";

/// Result of a lock acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// The lock directory was created by this attempt.
    Acquired,
    /// The lock directory already existed: a previous run is still active,
    /// crashed without cleanup, or runs have been disabled.
    Held,
}

/// Handle on the lock directory for one task class.
///
/// Holding a `LockDir` value does not imply holding the lock; only a
/// successful [`acquire`](LockDir::acquire) does.
#[derive(Debug, Clone)]
pub struct LockDir {
    path: PathBuf,
}

impl LockDir {
    /// Handle for the lock directory at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The lock directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attempt to create the lock directory.
    ///
    /// Creation is atomic: exactly one of any number of racing processes
    /// sees [`Acquire::Acquired`]. An existing directory is the expected
    /// contention signal; any other failure (permissions, missing parent,
    /// full disk) is fatal because exclusion cannot be guaranteed.
    pub fn acquire(&self) -> Result<Acquire, GuardError> {
        match fs::create_dir(&self.path) {
            Ok(()) => Ok(Acquire::Acquired),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Acquire::Held),
            Err(e) => Err(GuardError::io(
                "create the lock directory",
                &self.path,
                e,
            )),
        }
    }

    /// Remove the lock directory and everything in it, unless runs have
    /// been disabled, in which case it is left intact so the disable takes
    /// effect for subsequent invocations.
    ///
    /// Best-effort: by the time this runs we may be mid-shutdown with the
    /// logging machinery already gone, so failures are ignored. The next
    /// invocation will observe the stale directory and report contention,
    /// which is the fallback signal that something went wrong.
    pub fn release(&self) {
        if self.is_disabled() {
            return;
        }
        let _ = fs::remove_dir_all(&self.path);
    }

    /// Remove the lock directory unconditionally (operator recovery path).
    ///
    /// An already-absent directory is fine; other failures are reported.
    pub fn force_clear(&self) -> Result<(), GuardError> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GuardError::io(
                "remove the lock directory",
                &self.path,
                e,
            )),
        }
    }

    /// Whether the lock directory currently exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of the disable semaphore inside the lock directory.
    pub fn disabled_path(&self) -> PathBuf {
        self.path.join(DISABLED_SEMAPHORE)
    }

    /// Path of the alert-silence semaphore inside the lock directory.
    pub fn silenced_path(&self) -> PathBuf {
        self.path.join(SILENCED_SEMAPHORE)
    }

    /// Whether runs have been manually disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled_path().exists()
    }

    /// Whether lock-contention alerts have been silenced.
    pub fn is_silenced(&self) -> bool {
        self.silenced_path().exists()
    }
}
