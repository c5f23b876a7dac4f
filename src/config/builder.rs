//! Builder for [`GuardConfig`].

use std::path::PathBuf;
use std::time::Duration;

use super::types::{self, GuardConfig, DEFAULT_REALERT_EVERY};

/// Builder for creating a [`GuardConfig`] in code.
///
/// Paths not set explicitly default to `/var/log/<slug>.started` and
/// `/var/run/<slug>.lock`, derived from the task name.
#[derive(Debug, Clone)]
pub struct GuardConfigBuilder {
    task_name: String,
    task_article: Option<String>,
    tasks_name: Option<String>,
    last_started_file: Option<PathBuf>,
    lock_dir: Option<PathBuf>,
    alert_file: Option<PathBuf>,
    run_every: Duration,
    realert_every: Duration,
}

impl GuardConfigBuilder {
    /// Start a builder for the given task name.
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            task_article: None,
            tasks_name: None,
            last_started_file: None,
            lock_dir: None,
            alert_file: None,
            run_every: Duration::ZERO,
            realert_every: DEFAULT_REALERT_EVERY,
        }
    }

    /// Article used with the task name ("a" or "an").
    pub fn task_article(mut self, article: impl Into<String>) -> Self {
        self.task_article = Some(article.into());
        self
    }

    /// Plural form of the task name.
    pub fn tasks_name(mut self, plural: impl Into<String>) -> Self {
        self.tasks_name = Some(plural.into());
        self
    }

    /// Path of the last-started marker file.
    pub fn last_started_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.last_started_file = Some(path.into());
        self
    }

    /// Path of the lock directory.
    pub fn lock_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(path.into());
        self
    }

    /// Path of the alert-throttle marker file.
    pub fn alert_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.alert_file = Some(path.into());
        self
    }

    /// Minimum time between run starts; zero runs every invocation.
    pub fn run_every(mut self, window: Duration) -> Self {
        self.run_every = window;
        self
    }

    /// Minimum time between repeat contention alerts; zero means the first
    /// alert is the only one.
    pub fn realert_every(mut self, window: Duration) -> Self {
        self.realert_every = window;
        self
    }

    /// Finish building.
    pub fn build(self) -> GuardConfig {
        let slug = types::slug(&self.task_name);
        GuardConfig {
            task_article: self.task_article.unwrap_or_else(|| "a".to_string()),
            tasks_name: self
                .tasks_name
                .unwrap_or_else(|| format!("{}s", self.task_name)),
            last_started_file: self
                .last_started_file
                .unwrap_or_else(|| types::default_last_started(&slug)),
            lock_dir: self
                .lock_dir
                .unwrap_or_else(|| types::default_lock_dir(&slug)),
            alert_file: self.alert_file,
            run_every: self.run_every,
            realert_every: self.realert_every,
            task_name: self.task_name,
        }
    }
}
