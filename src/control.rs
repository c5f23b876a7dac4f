//! Manual operator controls.
//!
//! These operations are meant for command-line use, not autonomous
//! operation. Each toggles exactly one semaphore (or removes the lock) and
//! is idempotent: repeating one in the target state is a no-op with an
//! explanatory message. Actual state changes are additionally logged to
//! the `runguard::status` target so they stay auditable when the printed
//! message scrolls away or the command runs non-interactively.
//!
//! Operators are trusted not to race an active run when toggling
//! semaphores; nothing locks operator writes against the guarded process.

use std::fs;
use std::io;
use std::time::SystemTime;
use tracing::info;

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::fsmeta;
use crate::lock::LockDir;

/// Result of a control operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The on-disk state was changed; the message describes the new state.
    Changed(String),
    /// Already in the target state (or a precondition failed); nothing was
    /// touched.
    Unchanged(String),
}

impl ControlOutcome {
    /// The operator-facing message.
    pub fn message(&self) -> &str {
        match self {
            ControlOutcome::Changed(msg) | ControlOutcome::Unchanged(msg) => msg,
        }
    }

    /// Whether the operation changed anything.
    pub fn changed(&self) -> bool {
        matches!(self, ControlOutcome::Changed(_))
    }
}

/// Silence lock-contention alerts by touching the silence semaphore.
///
/// Keeping the semaphore inside the lock directory means the silencing is
/// cleared automatically when the lock is removed, so it requires the lock
/// directory to exist.
pub fn silence_alerts(config: &GuardConfig) -> Result<ControlOutcome, GuardError> {
    let lock = LockDir::new(config.lock_dir.clone());

    if !lock.exists() {
        return Ok(ControlOutcome::Unchanged(
            "Lock directory doesn't exist; nothing to silence.".to_string(),
        ));
    }
    if lock.is_silenced() {
        return Ok(ControlOutcome::Unchanged(
            "Lock alerts were already silenced.".to_string(),
        ));
    }

    let semaphore = lock.silenced_path();
    fsmeta::touch(&semaphore, SystemTime::now())
        .map_err(|e| GuardError::io("touch the semaphore file", &semaphore, e))?;

    info!(
        target: "runguard::status",
        "Lock alerts have been silenced for lock directory {}.",
        config.lock_dir.display()
    );
    Ok(ControlOutcome::Changed(
        "Lock alerts have been silenced.".to_string(),
    ))
}

/// Re-enable lock-contention alerts by removing the silence semaphore.
pub fn unsilence_alerts(config: &GuardConfig) -> Result<ControlOutcome, GuardError> {
    let lock = LockDir::new(config.lock_dir.clone());

    if !lock.is_silenced() {
        return Ok(ControlOutcome::Unchanged(
            "Lock alerts were already unsilenced.".to_string(),
        ));
    }

    remove_semaphore(&lock.silenced_path())?;

    info!(
        target: "runguard::status",
        "Lock alerts have been unsilenced for lock directory {}.",
        config.lock_dir.display()
    );
    Ok(ControlOutcome::Changed(
        "Lock alerts have been unsilenced.".to_string(),
    ))
}

/// Disable future runs by touching the disable semaphore, creating the
/// lock directory first if necessary so the semaphore has somewhere to
/// live. Release then leaves the lock in place, so every later invocation
/// reports contention until [`enable_runs`] and a lock clear.
pub fn disable_runs(config: &GuardConfig) -> Result<ControlOutcome, GuardError> {
    let lock = LockDir::new(config.lock_dir.clone());

    if lock.is_disabled() {
        return Ok(ControlOutcome::Unchanged(format!(
            "{} were already disabled.",
            config.tasks_title()
        )));
    }

    let mut message = String::new();
    if lock.exists() {
        message.push_str(&format!(
            "The lock directory exists; {} {} is probably running.\n\
             The disable will take effect after the current {} finishes.\n",
            config.task_article, config.task_name, config.task_name
        ));
    } else if let Err(e) = fs::create_dir(&config.lock_dir) {
        // A concurrent invocation may have just created it; that is fine.
        if e.kind() != io::ErrorKind::AlreadyExists {
            return Err(GuardError::io(
                "create the lock directory",
                &config.lock_dir,
                e,
            ));
        }
    }

    let semaphore = lock.disabled_path();
    fsmeta::touch(&semaphore, SystemTime::now())
        .map_err(|e| GuardError::io("touch the semaphore file", &semaphore, e))?;

    info!(
        target: "runguard::status",
        "{} have been disabled; lock directory is {}.",
        config.tasks_title(),
        config.lock_dir.display()
    );
    message.push_str(&format!(
        "{} have been disabled; remember to re-enable them later!",
        config.tasks_title()
    ));
    Ok(ControlOutcome::Changed(message))
}

/// Re-enable runs by removing the disable semaphore.
///
/// The lock directory itself is left alone: if no run is actually active,
/// the operator should follow up with [`clear_lock`].
pub fn enable_runs(config: &GuardConfig) -> Result<ControlOutcome, GuardError> {
    let lock = LockDir::new(config.lock_dir.clone());

    if !lock.is_disabled() {
        return Ok(ControlOutcome::Unchanged(format!(
            "{} were already enabled.",
            config.tasks_title()
        )));
    }

    remove_semaphore(&lock.disabled_path())?;

    info!(
        target: "runguard::status",
        "{} have been re-enabled; lock directory is {}.",
        config.tasks_title(),
        config.lock_dir.display()
    );
    Ok(ControlOutcome::Changed(format!(
        "{} have been re-enabled.\n\
         If {} {} is not currently running, you should now remove the\n\
         lock directory with the clear-lock command.",
        config.tasks_title(),
        config.task_article,
        config.task_name
    )))
}

/// Forcibly remove the lock directory, for recovery when an invocation is
/// known to have crashed.
///
/// The caller is responsible for confirming with the operator first; the
/// CLI prompts before calling this.
pub fn clear_lock(config: &GuardConfig) -> Result<ControlOutcome, GuardError> {
    let lock = LockDir::new(config.lock_dir.clone());

    if !lock.exists() {
        return Ok(ControlOutcome::Unchanged(
            "The lock directory has already been removed.".to_string(),
        ));
    }

    lock.force_clear()?;

    info!(
        target: "runguard::status",
        "Lock directory {} has been manually removed.",
        config.lock_dir.display()
    );
    Ok(ControlOutcome::Changed(format!(
        "The lock directory ({}) has been removed.",
        config.lock_dir.display()
    )))
}

/// Remove a semaphore file, tolerating its absence.
fn remove_semaphore(path: &std::path::Path) -> Result<(), GuardError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GuardError::io("remove the semaphore file", path, e)),
    }
}
