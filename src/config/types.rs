//! Guard configuration.
//!
//! All coordination state lives on the filesystem; this type carries the
//! paths involved plus the two time windows and the task wording used in
//! operator-facing messages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::builder::GuardConfigBuilder;

/// Default re-alert window for contention alerts: two hours.
pub const DEFAULT_REALERT_EVERY: Duration = Duration::from_secs(2 * 60 * 60);

/// Configuration for one guarded task class.
///
/// One long-lived value per process invocation; components borrow it rather
/// than reading process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Singular noun describing the task, e.g. "backup"; used in messages
    /// like "a backup may be in progress".
    pub task_name: String,
    /// Article to pair with `task_name` ("a" or "an").
    pub task_article: String,
    /// Plural of `task_name`, used in messages like "backups have been
    /// disabled".
    pub tasks_name: String,
    /// File whose mtime records when a run was last granted a start.
    pub last_started_file: PathBuf,
    /// Directory whose existence marks a run in progress (or crashed).
    pub lock_dir: PathBuf,
    /// Alert-throttle marker; defaults to the lock path with `.alert`
    /// appended, stored as a sibling of the lock directory.
    pub alert_file: Option<PathBuf>,
    /// Minimum time between run starts. Zero disables the check, so every
    /// invocation is considered due.
    pub run_every: Duration,
    /// Minimum time between repeat contention alerts for the same episode.
    /// Zero means the first alert is the only one.
    pub realert_every: Duration,
}

impl GuardConfig {
    /// Configuration with conventional path defaults for a task name:
    /// `/var/log/<slug>.started` and `/var/run/<slug>.lock`.
    pub fn for_task(task_name: impl Into<String>) -> Self {
        GuardConfigBuilder::new(task_name).build()
    }

    /// Start building a configuration.
    pub fn builder(task_name: impl Into<String>) -> GuardConfigBuilder {
        GuardConfigBuilder::new(task_name)
    }

    /// The resolved alert-throttle marker path.
    pub fn alert_path(&self) -> PathBuf {
        match &self.alert_file {
            Some(path) => path.clone(),
            None => {
                let mut os = self.lock_dir.clone().into_os_string();
                os.push(".alert");
                PathBuf::from(os)
            }
        }
    }

    /// `task_name` with the first letter capitalized, for sentence starts.
    pub fn task_title(&self) -> String {
        capitalize(&self.task_name)
    }

    /// `tasks_name` with the first letter capitalized.
    pub fn tasks_title(&self) -> String {
        capitalize(&self.tasks_name)
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), super::ConfigError> {
        if self.task_name.is_empty() {
            return Err(super::ConfigError::InvalidConfig(
                "task_name must not be empty".to_string(),
            ));
        }
        if self.lock_dir.as_os_str().is_empty() {
            return Err(super::ConfigError::InvalidConfig(
                "lock_dir must not be empty".to_string(),
            ));
        }
        if self.lock_dir == self.last_started_file {
            return Err(super::ConfigError::InvalidConfig(format!(
                "lock_dir and last_started_file must differ (both are '{}')",
                self.lock_dir.display()
            )));
        }
        if self.alert_path() == self.lock_dir {
            return Err(super::ConfigError::InvalidConfig(
                "alert_file must not be the lock directory itself".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lowercased, hyphenated form of a task name, for default file names.
pub(super) fn slug(task_name: &str) -> String {
    task_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Default marker-path location for a task slug.
pub(super) fn default_last_started(slug: &str) -> PathBuf {
    Path::new("/var/log").join(format!("{slug}.started"))
}

/// Default lock-directory location for a task slug.
pub(super) fn default_lock_dir(slug: &str) -> PathBuf {
    Path::new("/var/run").join(format!("{slug}.lock"))
}
