//! Common test utilities shared across integration tests.

use runguard::{AlertSink, GuardConfig};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Alert sink that records every message it receives, so tests can count
/// deliveries exactly.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alerts delivered so far.
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Copies of the delivered messages.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingSink {
    fn send(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// A guard configuration rooted in a test-owned directory: 60-minute run
/// interval, 2-hour re-alert window.
pub fn test_config(root: &Path) -> GuardConfig {
    GuardConfig::builder("backup")
        .last_started_file(root.join("backup.started"))
        .lock_dir(root.join("backup.lock"))
        .run_every(Duration::from_secs(60 * 60))
        .realert_every(Duration::from_secs(2 * 60 * 60))
        .build()
}
