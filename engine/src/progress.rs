//! Progress reporting.
//!
//! `RunClock` captures when a run started and formats the run timestamp and
//! the elapsed time. `ProgressCallback` decouples the engine from whatever
//! renders progress; the CLI prints one line per action.

use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use crate::model::{Addition, AdditionKind, Deletion, RunOutcome, RunStats, SyncConfig, SyncPlan};

/// Format of the run timestamp in both logs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wall-clock start of a run plus a monotonic clock for elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        RunClock {
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Start time as "YYYY-MM-DD HH:MM:SS" in UTC.
    pub fn timestamp(&self) -> String {
        self.started_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time as "HH:MM:SS".
    pub fn elapsed_hms(&self) -> String {
        format_hms(self.elapsed())
    }

    /// Prefix `text` with the bracketed elapsed time.
    pub fn line(&self, text: &str) -> String {
        format!("[{}] {}", self.elapsed_hms(), text)
    }
}

/// Format a duration as "HH:MM:SS". Hours do not wrap at 24.
pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// "Del > path" for any deletion.
pub fn describe_deletion(deletion: &Deletion) -> String {
    format!("Del > {}", deletion.path.display())
}

/// "Add > source" for new entries, "Upd > destination" for replacements.
pub fn describe_addition(addition: &Addition) -> String {
    match addition.kind {
        AdditionKind::New => format!("Add > {}", addition.source.display()),
        AdditionKind::Replace => format!("Upd > {}", addition.destination.display()),
    }
}

/// Trait for receiving progress updates from a backup run.
///
/// All methods are called synchronously on the thread running the backup.
/// Per-item callbacks fire before the mutation is performed.
pub trait ProgressCallback: Send {
    /// Called once, before the safety checks.
    fn on_run_started(&self, clock: &RunClock, config: &SyncConfig);

    /// Called when the differ has produced the work lists.
    fn on_plan_ready(&self, clock: &RunClock, plan: &SyncPlan);

    /// Called before a destination entry is removed.
    fn on_deletion(&self, clock: &RunClock, deletion: &Deletion);

    /// Called before a source entry is copied.
    fn on_addition(&self, clock: &RunClock, addition: &Addition);

    /// Called once when the run ends, whatever the outcome.
    fn on_run_completed(&self, clock: &RunClock, stats: &RunStats, outcome: &RunOutcome);
}
