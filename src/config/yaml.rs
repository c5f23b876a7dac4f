//! YAML configuration parsing.
//!
//! Loads a guard configuration from a YAML file. Durations are
//! human-readable strings ("1h 30m", "45s"); unknown fields are rejected so
//! typos fail loudly instead of silently taking defaults.
//!
//! ```yaml
//! task_name: backup
//! lock_dir: /var/run/backup.lock
//! last_started_file: /var/log/backup.started
//! run_every: 1h
//! realert_every: 2h
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::ConfigError;
use super::types::GuardConfig;

/// Raw YAML shape of the guard configuration; everything except
/// `task_name` is optional and falls back to the builder defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfigFile {
    /// Singular noun for the task, e.g. "backup". Required.
    pub task_name: Option<String>,
    /// Article to pair with the task name.
    pub task_article: Option<String>,
    /// Plural of the task name.
    pub tasks_name: Option<String>,
    /// Path of the last-started marker file.
    pub last_started_file: Option<PathBuf>,
    /// Path of the lock directory.
    pub lock_dir: Option<PathBuf>,
    /// Path of the alert-throttle marker file.
    pub alert_file: Option<PathBuf>,
    /// Minimum time between run starts ("1h", "30m"); "0s" runs always.
    #[serde(with = "humantime_serde")]
    pub run_every: Option<Duration>,
    /// Minimum time between repeat contention alerts; "0s" means first
    /// alert only.
    #[serde(with = "humantime_serde")]
    pub realert_every: Option<Duration>,
}

impl GuardConfigFile {
    /// Resolve the raw file into a validated [`GuardConfig`].
    pub fn resolve(self) -> Result<GuardConfig, ConfigError> {
        let task_name = self
            .task_name
            .ok_or_else(|| ConfigError::MissingField("task_name".to_string()))?;

        let mut builder = GuardConfig::builder(task_name);
        if let Some(article) = self.task_article {
            builder = builder.task_article(article);
        }
        if let Some(plural) = self.tasks_name {
            builder = builder.tasks_name(plural);
        }
        if let Some(path) = self.last_started_file {
            builder = builder.last_started_file(path);
        }
        if let Some(path) = self.lock_dir {
            builder = builder.lock_dir(path);
        }
        if let Some(path) = self.alert_file {
            builder = builder.alert_file(path);
        }
        if let Some(window) = self.run_every {
            builder = builder.run_every(window);
        }
        if let Some(window) = self.realert_every {
            builder = builder.realert_every(window);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

/// Load and validate a guard configuration from a YAML file.
pub fn load_guard_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_guard_config(&contents, path)
}

/// Parse a guard configuration from YAML text; `path` is only used for
/// error messages.
pub fn parse_guard_config(contents: &str, path: &Path) -> Result<GuardConfig, ConfigError> {
    let file: GuardConfigFile =
        serde_yaml::from_str(contents).map_err(|source| ConfigError::YamlFileError {
            path: path.to_path_buf(),
            source,
        })?;
    file.resolve()
}
