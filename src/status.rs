//! Human-readable status reporting.
//!
//! A pure read over the on-disk state: no mutation, safe to call at any
//! time, including while another process holds the lock. Note that a lock
//! directory left by a crashed run is indistinguishable from one held by
//! an active run; the report words itself accordingly ("may be in
//! progress") and leaves the judgment to the operator.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::GuardConfig;
use crate::fsmeta;
use crate::lock::LockDir;

/// Render the complete status report: the message section followed by the
/// metadata section.
///
/// `full` is reserved for debugging extras and currently adds nothing
/// beyond the standard sections.
pub fn render_status(config: &GuardConfig, full: bool) -> String {
    format!(
        "{}\n\n{}",
        render_messages(config, full),
        render_metadata(config, full)
    )
}

/// Short human sentences summarizing the overall state.
pub fn render_messages(config: &GuardConfig, _full: bool) -> String {
    let lock = LockDir::new(config.lock_dir.clone());
    let mut msg = String::from("-------\nStatus:\n-------\n\n");

    if !config.last_started_file.exists() {
        let _ = writeln!(
            msg,
            "No last-started file; this {} appears to have never been run.",
            config.task_name
        );
    }

    if lock.exists() {
        let _ = writeln!(
            msg,
            "Lock directory exists; {} {} may be in progress.",
            config.task_article, config.task_name
        );
    } else {
        let _ = writeln!(
            msg,
            "No lock directory found; {} are enabled but not in progress.",
            config.tasks_name
        );
    }

    if config.alert_path().exists() {
        let _ = writeln!(
            msg,
            "Alert file exists; a running {} prevented a new one from starting.",
            config.task_name
        );
    }

    if lock.is_silenced() {
        msg.push_str("Lock alerts have been silenced.\n");
    }

    if lock.is_disabled() {
        let _ = writeln!(
            msg,
            "{} have been disabled (but the last one may still be running).",
            config.tasks_title()
        );
    }

    msg
}

/// One `ls -l`-style line per entity; `(none)` when absent.
pub fn render_metadata(config: &GuardConfig, _full: bool) -> String {
    let lock = LockDir::new(config.lock_dir.clone());
    let mut msg = String::from(
        "------------------------------\nTimestamps and other metadata:\n------------------------------\n",
    );

    let alert_path = config.alert_path();
    let silenced_path = lock.silenced_path();
    let disabled_path = lock.disabled_path();
    let entries: [(&str, &Path); 5] = [
        ("last-started file", &config.last_started_file),
        ("lock directory", &config.lock_dir),
        ("alert file", &alert_path),
        ("alerts-silenced semaphore", &silenced_path),
        ("disabled semaphore", &disabled_path),
    ];
    for (label, path) in entries {
        let line = match fsmeta::metadata_line(path) {
            Ok(Some(line)) => line,
            // Unreadable entries degrade to a note rather than failing
            // the whole report.
            Ok(None) => "(none)".to_string(),
            Err(e) => format!("(unreadable: {e})"),
        };
        let _ = write!(msg, "\n{label}:\n{line}\n");
    }

    msg
}
