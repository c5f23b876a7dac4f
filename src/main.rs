//! runguard - run a command under an exclusive, cron-friendly guard.
//!
//! Usage:
//!   runguard --task backup run -- /usr/local/bin/backup.sh
//!   runguard --config guard.yaml status
//!   runguard --config guard.yaml disable
//!
//! Exit statuses surfaced to the scheduler: 0 = ran or skipped (interval
//! not elapsed), 1 = the wrapped command itself failed, 10 = startup
//! error, 11 = lock contention (previous run active, disabled, or
//! throttled).

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use runguard::{
    control, load_guard_config, CheckOutcome, ControlOutcome, ExitStatus, Guard, GuardConfig,
    GuardError,
};

/// runguard - exclusive-execution guard for cron-driven tasks
#[derive(Parser)]
#[command(name = "runguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Task name; without --config, paths default to
    /// /var/log/<task>.started and /var/run/<task>.lock
    #[arg(short, long, global = true, value_name = "NAME")]
    task: Option<String>,

    /// Override the lock directory path
    #[arg(long, global = true, value_name = "DIR")]
    lock_dir: Option<PathBuf>,

    /// Override the last-started marker path
    #[arg(long, global = true, value_name = "FILE")]
    last_started_file: Option<PathBuf>,

    /// Override the minimum time between run starts (e.g. "1h", "30m";
    /// "0s" runs every invocation)
    #[arg(long, global = true, value_name = "DURATION", value_parser = humantime::parse_duration)]
    run_every: Option<Duration>,

    /// Override the minimum time between repeat contention alerts
    /// ("0s" means first alert only)
    #[arg(long, global = true, value_name = "DURATION", value_parser = humantime::parse_duration)]
    realert_every: Option<Duration>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the guard, then run a command under it
    Run {
        /// The command and its arguments
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<OsString>,
    },

    /// Print the current lock/semaphore/timestamp state
    Status {
        /// Include debugging detail
        #[arg(long)]
        full: bool,
    },

    /// Silence lock-contention alerts until unsilenced or the lock clears
    Silence,

    /// Re-enable lock-contention alerts
    Unsilence,

    /// Disable future runs until re-enabled
    Disable,

    /// Re-enable runs after a disable
    Enable,

    /// Forcibly remove the lock directory (recovery after a crash)
    ClearLock {
        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            error!("{message}");
            return ExitStatus::Startup.into();
        }
    };

    match &cli.command {
        Commands::Run { command } => run_command(&config, command),
        Commands::Status { full } => {
            println!("{}", Guard::new(config).render_status(*full));
            ExitStatus::NoError.into()
        }
        Commands::Silence => control_command(control::silence_alerts(&config)),
        Commands::Unsilence => control_command(control::unsilence_alerts(&config)),
        Commands::Disable => control_command(control::disable_runs(&config)),
        Commands::Enable => control_command(control::enable_runs(&config)),
        Commands::ClearLock { yes } => clear_lock_command(&config, *yes),
    }
}

/// Assemble the effective configuration from the config file, the task
/// name, and any explicit overrides.
fn resolve_config(cli: &Cli) -> Result<GuardConfig, String> {
    let mut config = match (&cli.config, &cli.task) {
        (Some(path), _) => load_guard_config(path).map_err(|e| e.to_string())?,
        (None, Some(task)) => GuardConfig::for_task(task),
        (None, None) => {
            return Err("either --config or --task is required".to_string());
        }
    };

    if let Some(path) = &cli.lock_dir {
        config.lock_dir = path.clone();
    }
    if let Some(path) = &cli.last_started_file {
        config.last_started_file = path.clone();
    }
    if let Some(window) = cli.run_every {
        config.run_every = window;
    }
    if let Some(window) = cli.realert_every {
        config.realert_every = window;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Check the guard and, if clear, execute the wrapped command.
fn run_command(config: &GuardConfig, command: &[OsString]) -> ExitCode {
    let guard = Guard::new(config.clone());
    let outcome = match guard.check_status() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{e}");
            return e.exit_status().into();
        }
    };

    let run = match outcome {
        CheckOutcome::NotDue => return ExitStatus::NoError.into(),
        CheckOutcome::Contended(_) => return ExitStatus::Contention.into(),
        CheckOutcome::Ready(run) => run,
    };

    let Some((program, args)) = command.split_first() else {
        error!("no command given");
        return ExitStatus::Startup.into();
    };
    let status = std::process::Command::new(program).args(args).status();

    // The guard is released on drop, after the child has finished.
    drop(run);

    match status {
        Ok(status) if status.success() => {
            info!("{} finished.", config.task_title());
            ExitStatus::NoError.into()
        }
        Ok(status) => {
            error!("{} failed: {status}.", config.task_title());
            ExitCode::from(1)
        }
        Err(e) => {
            error!(
                "could not run {}: {e}",
                PathBuf::from(program).display()
            );
            ExitStatus::Startup.into()
        }
    }
}

/// Print a control operation's message and map its outcome to an exit
/// status. Failed preconditions ("already silenced") exit with the
/// startup status so scripts notice no change was made.
fn control_command(result: Result<ControlOutcome, GuardError>) -> ExitCode {
    match result {
        Ok(outcome) => {
            println!("\n{}\n", outcome.message());
            if outcome.changed() {
                ExitStatus::NoError.into()
            } else {
                ExitStatus::Startup.into()
            }
        }
        Err(e) => {
            error!("{e}");
            e.exit_status().into()
        }
    }
}

/// Confirm, then forcibly clear the lock directory.
fn clear_lock_command(config: &GuardConfig, yes: bool) -> ExitCode {
    if !yes && !confirm_clear(config) {
        println!("\nExiting.\n");
        return ExitStatus::NoError.into();
    }
    control_command(control::clear_lock(config))
}

/// Interactive y/n prompt; anything but "y" declines.
fn confirm_clear(config: &GuardConfig) -> bool {
    print!(
        "\nWARNING: the lock directory should only be removed if you're sure that\n\
         {} {} is not currently running.\n\
         Continue (y/n)? ",
        config.task_article, config.task_name
    );
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}
