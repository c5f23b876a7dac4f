//! Alert throttling across a contention episode.
//!
//! Each test holds the lock with one guard, then drives repeated
//! contending invocations through a recording sink and counts exactly how
//! many alerts go out.

use crate::common::{test_config, RecordingSink};
use runguard::{control, AlertSink, CheckOutcome, Contention, Guard, GuardConfig, RunGuard};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

const SECOND: Duration = Duration::from_secs(1);

/// Interval checking is off here so contending invocations reach the lock
/// no matter how recently the holder started; these tests are about what
/// happens after that.
fn throttle_config(root: &Path) -> GuardConfig {
    let mut config = test_config(root);
    config.run_every = Duration::ZERO;
    config
}

/// Acquire the lock so later invocations contend.
fn hold_lock(config: &GuardConfig, now: SystemTime) -> RunGuard {
    match Guard::new(config.clone()).check_status_at(now).unwrap() {
        CheckOutcome::Ready(run) => run,
        other => panic!("expected Ready, got {other:?}"),
    }
}

/// One contending invocation through a fresh guard sharing `sink`.
fn contend(config: &GuardConfig, sink: &Arc<RecordingSink>, now: SystemTime) -> Contention {
    let sink: Arc<dyn AlertSink> = Arc::clone(sink) as Arc<dyn AlertSink>;
    let guard = Guard::with_alert_sink(config.clone(), sink);
    match guard.check_status_at(now).unwrap() {
        CheckOutcome::Contended(contention) => contention,
        other => panic!("expected Contended, got {other:?}"),
    }
}

#[test]
fn first_contention_sends_exactly_one_alert() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());
    let now = SystemTime::now();
    let _run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    let contention = contend(&config, &sink, now + SECOND);

    assert!(contention.alerted);
    assert!(!contention.disabled);
    assert_eq!(sink.count(), 1);
    assert!(sink.messages()[0].contains("still running or failed"));
    assert!(config.alert_path().exists());
}

#[test]
fn second_contention_within_window_is_throttled() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());
    let now = SystemTime::now();
    let _run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    contend(&config, &sink, now + SECOND);
    // 10 seconds later, well inside the 2-hour re-alert window.
    let contention = contend(&config, &sink, now + 11 * SECOND);

    assert!(!contention.alerted);
    assert_eq!(sink.count(), 1);
}

#[test]
fn contention_after_window_realerts_exactly_once() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());
    let now = SystemTime::now();
    let _run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    contend(&config, &sink, now + SECOND);
    contend(&config, &sink, now + 10 * SECOND);

    let past_window = now + SECOND + config.realert_every + SECOND;
    let contention = contend(&config, &sink, past_window);

    assert!(contention.alerted);
    assert_eq!(sink.count(), 2);

    // The re-alert re-touched the marker, so the window restarts.
    let contention = contend(&config, &sink, past_window + 10 * SECOND);
    assert!(!contention.alerted);
    assert_eq!(sink.count(), 2);
}

#[test]
fn silencing_suppresses_alerts_but_not_the_contention_outcome() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());
    let now = SystemTime::now();
    let _run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    contend(&config, &sink, now + SECOND);
    control::silence_alerts(&config).unwrap();

    // Even far beyond the re-alert window, nothing more goes out...
    let contention = contend(&config, &sink, now + config.realert_every * 3);
    assert!(!contention.alerted);
    assert_eq!(sink.count(), 1);

    // ...until unsilenced.
    control::unsilence_alerts(&config).unwrap();
    let contention = contend(&config, &sink, now + config.realert_every * 3 + SECOND);
    assert!(contention.alerted);
    assert_eq!(sink.count(), 2);
}

#[test]
fn disabling_suppresses_realerts() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());
    let now = SystemTime::now();
    let _run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    contend(&config, &sink, now + SECOND);
    control::disable_runs(&config).unwrap();

    let contention = contend(&config, &sink, now + config.realert_every * 3);
    assert!(contention.disabled);
    assert!(!contention.alerted);
    assert_eq!(sink.count(), 1);
}

#[test]
fn disabled_first_contention_alert_mentions_the_disable() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());

    // Disable with no run active; the disable itself creates the lock.
    control::disable_runs(&config).unwrap();
    let sink = Arc::new(RecordingSink::new());

    let contention = contend(&config, &sink, SystemTime::now());

    assert!(contention.disabled);
    assert!(contention.alerted, "first detection still alerts");
    assert_eq!(sink.count(), 1);
    assert!(sink.messages()[0].contains("manually disabled"));
}

#[test]
fn zero_realert_window_means_one_alert_per_episode() {
    let dir = tempdir().unwrap();
    let mut config = throttle_config(dir.path());
    config.realert_every = Duration::ZERO;
    let now = SystemTime::now();
    let _run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    contend(&config, &sink, now + SECOND);
    let contention = contend(&config, &sink, now + 365 * 24 * 3600 * SECOND);

    assert!(!contention.alerted);
    assert_eq!(sink.count(), 1);
}

#[test]
fn clean_completion_resets_the_episode() {
    let dir = tempdir().unwrap();
    let config = throttle_config(dir.path());
    let now = SystemTime::now();
    let run = hold_lock(&config, now);
    let sink = Arc::new(RecordingSink::new());

    contend(&config, &sink, now + SECOND);
    assert_eq!(sink.count(), 1);

    // First run completes cleanly; a later run acquires and clears the
    // sibling alert marker, closing the episode.
    drop(run);
    let next = hold_lock(&config, now + 90 * Duration::from_secs(60));
    assert!(!config.alert_path().exists());
    drop(next);

    // A brand-new episode alerts afresh.
    let _run = hold_lock(&config, now + 200 * Duration::from_secs(60));
    let contention = contend(&config, &sink, now + 201 * Duration::from_secs(60));
    assert!(contention.alerted);
    assert_eq!(sink.count(), 2);
}
