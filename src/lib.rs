//! runguard - exclusive-execution guard for periodically-invoked tasks.
//!
//! A task run repeatedly from cron (or any external scheduler) calls
//! [`Guard::check_status`] at startup to find out whether it should
//! actually do its work this time:
//!
//! - the **elapsed-time gate** skips the run if not enough time has passed
//!   since the last start;
//! - the **exclusion lock** (an atomically-created directory) prevents
//!   overlapping runs, including ones that crashed without cleanup;
//! - the **alert throttler** pages an operator once per contention episode
//!   and then stays quiet until a re-alert window elapses;
//! - **semaphore files** inside the lock directory let an operator silence
//!   alerts or disable future runs entirely;
//! - the **status reporter** and **manual controls** give operators a
//!   read-only view and explicit toggles over the same on-disk state.
//!
//! The only coordination medium is the filesystem: each invocation is a
//! separate process, and the atomicity of "create directory, fail if it
//! exists" is the sole synchronization primitive. Lock acquisition never
//! blocks; on contention the process reports and exits, and the scheduler
//! simply tries again later.
//!
//! ```no_run
//! use runguard::{CheckOutcome, Guard, GuardConfig};
//! use std::time::Duration;
//!
//! let config = GuardConfig::builder("backup")
//!     .run_every(Duration::from_secs(3600))
//!     .build();
//!
//! match Guard::new(config).check_status()? {
//!     CheckOutcome::Ready(run) => {
//!         // ... do the actual work ...
//!         drop(run); // releases the lock
//!     }
//!     CheckOutcome::NotDue => {}       // too soon; exit 0
//!     CheckOutcome::Contended(_) => {} // previous run active; exit 11
//! }
//! # Ok::<(), runguard::GuardError>(())
//! ```

pub mod alert;
pub mod config;
pub mod control;
pub mod error;
pub mod fsmeta;
pub mod gate;
pub mod lifecycle;
pub mod lock;
pub mod status;

pub use alert::{AlertSink, LogAlertSink, Suppressed, Throttle, Throttler};
pub use config::{
    load_guard_config, ConfigError, GuardConfig, GuardConfigBuilder, DEFAULT_REALERT_EVERY,
};
pub use control::{
    clear_lock, disable_runs, enable_runs, silence_alerts, unsilence_alerts, ControlOutcome,
};
pub use error::{ExitStatus, GuardError};
pub use lifecycle::{CheckOutcome, Contention, Guard, RunGuard};
pub use lock::{Acquire, LockDir, DISABLED_SEMAPHORE, SILENCED_SEMAPHORE};
pub use status::render_status;
