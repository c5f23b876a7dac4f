//! Gate, lock, and release behavior across simulated invocations.

use crate::common::test_config;
use runguard::{control, fsmeta, CheckOutcome, ExitStatus, Guard, RunGuard};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

const MINUTE: Duration = Duration::from_secs(60);

fn expect_ready(outcome: CheckOutcome) -> RunGuard {
    match outcome {
        CheckOutcome::Ready(run) => run,
        other => panic!("expected Ready, got {other:?}"),
    }
}

#[test]
fn gate_blocks_within_interval_without_touching_the_lock() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let now = SystemTime::now();
    fsmeta::touch(&config.last_started_file, now).unwrap();

    // interval = 60 min, marker age = 30 min
    let guard = Guard::new(config.clone());
    let outcome = guard.check_status_at(now + 30 * MINUTE).unwrap();

    assert!(matches!(outcome, CheckOutcome::NotDue));
    assert_eq!(outcome.exit_status(), ExitStatus::NoError);
    assert!(!config.lock_dir.exists(), "gate must not acquire the lock");
}

#[test]
fn gate_passes_after_interval_and_updates_marker() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let now = SystemTime::now();
    fsmeta::touch(&config.last_started_file, now).unwrap();

    // interval = 60 min, marker age = 90 min
    let later = now + 90 * MINUTE;
    let guard = Guard::new(config.clone());
    let run = expect_ready(guard.check_status_at(later).unwrap());

    assert!(config.lock_dir.exists());
    // Marker was re-touched to the invocation's own "now" (modulo
    // filesystem mtime precision).
    assert!(fsmeta::age(&config.last_started_file, later).unwrap() < Duration::from_secs(1));
    drop(run);
}

#[test]
fn gate_passes_when_never_run_before() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let guard = Guard::new(config.clone());

    let run = expect_ready(guard.check_status_at(SystemTime::now()).unwrap());
    assert!(config.last_started_file.exists());
    drop(run);
}

#[test]
fn zero_interval_never_blocks() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.run_every = Duration::ZERO;
    let now = SystemTime::now();
    fsmeta::touch(&config.last_started_file, now).unwrap();

    // Marker is brand new, but interval checking is off.
    let guard = Guard::new(config.clone());
    let run = expect_ready(guard.check_status_at(now).unwrap());
    drop(run);
}

#[test]
fn concurrent_invocation_sees_contention() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let now = SystemTime::now();

    let first = Guard::new(config.clone());
    let run = expect_ready(first.check_status_at(now).unwrap());

    // A second invocation, due again by the gate, while the first still
    // holds the lock.
    let second = Guard::new(config.clone());
    let outcome = second.check_status_at(now + 90 * MINUTE).unwrap();
    match outcome {
        CheckOutcome::Contended(contention) => {
            assert!(!contention.disabled);
            assert_eq!(
                CheckOutcome::Contended(contention).exit_status(),
                ExitStatus::Contention
            );
        }
        other => panic!("expected Contended, got {other:?}"),
    }

    // Once the first run finishes, the next invocation gets through.
    drop(run);
    let third = Guard::new(config.clone());
    let run = expect_ready(third.check_status_at(now + 91 * MINUTE).unwrap());
    drop(run);
}

#[test]
fn release_preserves_lock_when_disabled_mid_run() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let guard = Guard::new(config.clone());
    let run = expect_ready(guard.check_status_at(SystemTime::now()).unwrap());

    // Operator disables while the run is in progress.
    control::disable_runs(&config).unwrap();

    drop(run);

    // The lock directory and its semaphore survive the release, so every
    // future invocation reports contention until re-enabled and cleared.
    assert!(config.lock_dir.exists());
    assert!(config.lock_dir.join(runguard::DISABLED_SEMAPHORE).exists());

    let next = Guard::new(config.clone());
    let outcome = next
        .check_status_at(SystemTime::now() + 90 * MINUTE)
        .unwrap();
    match outcome {
        CheckOutcome::Contended(contention) => assert!(contention.disabled),
        other => panic!("expected Contended, got {other:?}"),
    }
}

#[test]
fn stale_alert_marker_from_crashed_episode_is_cleared() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let now = SystemTime::now();

    // Leftover sibling marker from an episode whose lock directory was
    // removed by hand.
    fsmeta::touch(&config.alert_path(), now).unwrap();

    let guard = Guard::new(config.clone());
    let run = expect_ready(guard.check_status_at(now).unwrap());

    assert!(!config.alert_path().exists());
    drop(run);
}

#[test]
fn leaked_lock_blocks_until_cleared() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let now = SystemTime::now();

    // Simulate a crash: the guard is forgotten, so release never runs.
    let guard = Guard::new(config.clone());
    let run = expect_ready(guard.check_status_at(now).unwrap());
    std::mem::forget(run);
    assert!(config.lock_dir.exists());

    // The next invocation cannot tell a crash from an active run.
    let next = Guard::new(config.clone());
    let outcome = next.check_status_at(now + 90 * MINUTE).unwrap();
    assert!(matches!(outcome, CheckOutcome::Contended(_)));

    // Operator recovery: clear, then acquire succeeds immediately.
    control::clear_lock(&config).unwrap();
    let recovered = Guard::new(config.clone());
    let run = expect_ready(recovered.check_status_at(now + 91 * MINUTE).unwrap());
    drop(run);
}
