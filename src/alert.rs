//! Lock-contention alerting: the sink seam and the throttling decision.
//!
//! Contention is always an error outcome for the scheduler; whether an
//! *alert* goes out for it is a separate decision, made here, so a wedged
//! task pages an operator once and then stays quiet until the re-alert
//! window elapses.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::GuardError;
use crate::fsmeta;

/// Destination for alerts that should reach an operator through a channel
/// beyond the ordinary log stream (email, chat, pager).
///
/// Delivery itself is out of scope for this crate; implement this trait to
/// plug in a real channel.
pub trait AlertSink: Send + Sync {
    /// Deliver one alert message.
    fn send(&self, message: &str);
}

/// Default sink: routes alerts to the `runguard::alert` log target at
/// error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn send(&self, message: &str) {
        tracing::error!(target: "runguard::alert", "{message}");
    }
}

/// Why a contention alert was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    /// Runs have been manually disabled; the operator already knows.
    Disabled,
    /// Re-alerting is turned off by configuration.
    ReAlertsOff,
    /// The alert-silence semaphore is present.
    Silenced,
    /// The re-alert window has not elapsed since the last alert.
    WithinWindow,
}

/// Outcome of the throttling decision for one contention event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    /// First detection of this contention episode; alert.
    FirstAlert,
    /// A prior alert was sent and the re-alert window has elapsed; alert
    /// again.
    ReAlert,
    /// Log only; no alert.
    Suppress(Suppressed),
}

impl Throttle {
    /// Whether this decision delivers an alert.
    pub fn alerts(self) -> bool {
        matches!(self, Throttle::FirstAlert | Throttle::ReAlert)
    }
}

/// Decides whether a "lock already held" event should produce an alert.
///
/// State is read from the alert-throttle marker: absent means this is the
/// first detection of the episode; present, its age against the re-alert
/// window gates repeats. The marker is removed with the lock directory at
/// the end of a clean run, resetting alert state for the next episode.
#[derive(Debug)]
pub struct Throttler<'a> {
    alert_file: &'a Path,
    realert_every: Duration,
}

impl<'a> Throttler<'a> {
    /// Throttler over the given marker path and re-alert window.
    pub fn new(alert_file: &'a Path, realert_every: Duration) -> Self {
        Self {
            alert_file,
            realert_every,
        }
    }

    /// Run the decision tree for one contention event.
    ///
    /// `disabled` and `silenced` are the semaphore states observed by the
    /// caller. Failing to stat an existing marker is a fatal error, not a
    /// suppression.
    pub fn decide(
        &self,
        disabled: bool,
        silenced: bool,
        now: SystemTime,
    ) -> Result<Throttle, GuardError> {
        if !self.alert_file.exists() {
            return Ok(Throttle::FirstAlert);
        }
        if disabled {
            return Ok(Throttle::Suppress(Suppressed::Disabled));
        }
        if self.realert_every.is_zero() {
            return Ok(Throttle::Suppress(Suppressed::ReAlertsOff));
        }
        if silenced {
            return Ok(Throttle::Suppress(Suppressed::Silenced));
        }
        match fsmeta::modified_within(self.alert_file, self.realert_every, now) {
            Ok(true) => Ok(Throttle::Suppress(Suppressed::WithinWindow)),
            Ok(false) => Ok(Throttle::ReAlert),
            Err(e) => Err(GuardError::io("stat the alert file", self.alert_file, e)),
        }
    }
}
