//! BackUP - Command-line interface for the incremental mirror engine.
//!
//! Mirrors a source folder onto a backup folder, printing one line per
//! action and mapping the run outcome to a distinct exit code.

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use engine::{
    model::{Addition, Deletion, RunOutcome, RunStats, SyncConfig, SyncPlan},
    progress::{describe_addition, describe_deletion, ProgressCallback, RunClock},
    describe_outcome, run_backup,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Run finished and the completion record was written.
const EXIT_OK: i32 = 0;
/// The backup log was found in the source folder.
const EXIT_LOG_ON_SOURCE: i32 = 1;
/// The backup log was not found in the destination folder.
const EXIT_LOG_MISSING: i32 = 2;
/// Diff or apply failed partway.
const EXIT_FAILED: i32 = 3;
/// Missing or malformed arguments (sysexits EX_USAGE).
const EXIT_USAGE: i32 = 64;

/// BackUP - incremental one-way folder mirror
#[derive(Parser, Debug)]
#[command(name = "backup")]
#[command(version = "0.1.0")]
#[command(about = "Mirror a source folder onto a backup folder, comparing by modification time and size")]
struct Args {
    /// Folder to back up
    #[arg(value_name = "SOURCE")]
    src: PathBuf,

    /// Backup folder; must already contain the backup log
    #[arg(value_name = "DESTINATION")]
    dst: PathBuf,

    /// File receiving fatal error messages
    #[arg(value_name = "ERROR_LOG")]
    error_log: PathBuf,

    /// Enable debug logging on stderr
    #[arg(long)]
    verbose: bool,

    /// Only print the start and end of the run, not every action
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,
}

/// CLI implementation of ProgressCallback printing to stdout
struct CliProgress {
    quiet: bool,
    config: SyncConfig,
}

impl CliProgress {
    fn new(quiet: bool, config: &SyncConfig) -> Self {
        CliProgress {
            quiet,
            config: config.clone(),
        }
    }

    fn print(&self, clock: &RunClock, text: &str) {
        println!("{}", clock.line(text));
    }
}

impl ProgressCallback for CliProgress {
    fn on_run_started(&self, clock: &RunClock, config: &SyncConfig) {
        self.print(clock, &format!("Starting backup on {}", clock.timestamp()));
        if !self.quiet {
            self.print(clock, &format!("  Source: {}", config.source.display()));
            self.print(clock, &format!("  Destination: {}", config.destination.display()));
        }
    }

    fn on_plan_ready(&self, clock: &RunClock, plan: &SyncPlan) {
        self.print(
            clock,
            &format!(
                "Pending: {} additions, {} deletions",
                plan.additions.len(),
                plan.deletions.len()
            ),
        );
    }

    fn on_deletion(&self, clock: &RunClock, deletion: &Deletion) {
        if !self.quiet {
            self.print(clock, &describe_deletion(deletion));
        }
    }

    fn on_addition(&self, clock: &RunClock, addition: &Addition) {
        if !self.quiet {
            self.print(clock, &describe_addition(addition));
        }
    }

    fn on_run_completed(&self, clock: &RunClock, stats: &RunStats, outcome: &RunOutcome) {
        if outcome.is_success() {
            self.print(clock, "Finished backup");
            self.print(
                clock,
                &format!(
                    "Summary: {} processed, {} added, {} updated, {} deleted, {} unchanged",
                    stats.processed, stats.added, stats.updated, stats.deleted, stats.ignored
                ),
            );
            return;
        }

        self.print(clock, &describe_outcome(outcome, &self.config));
        if let Some(path) = &stats.in_flight {
            self.print(clock, &format!("Interrupted at: {}", path.display()));
        }
    }
}

fn exit_code(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Completed => EXIT_OK,
        RunOutcome::LogOnSource => EXIT_LOG_ON_SOURCE,
        RunOutcome::LogMissingOnDestination => EXIT_LOG_MISSING,
        RunOutcome::Failed(_) => EXIT_FAILED,
    }
}

/// Log level used when `RUST_LOG` is not set.
fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {}", e);
    }
}

/// Parse arguments, run the backup and exit with the outcome's code
fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_OK,
                _ => EXIT_USAGE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(args.verbose);

    let outcome = run_cli(&args);
    std::process::exit(exit_code(&outcome));
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> RunOutcome {
    let config = SyncConfig::new(&args.src, &args.dst, &args.error_log);
    let progress = CliProgress::new(args.quiet, &config);
    run_backup(&config, Some(&progress))
}
