//! Append-only run journals.
//!
//! - `BackupLog`: one JSON record per run, kept in the destination root
//! - `ErrorLog`: one timestamped line per fatal event
//! - `CompletionGuard`: owns the run statistics during diff and apply and
//!   writes the completion record exactly once, on `finish` or on unwind
//!
//! Each write opens the file in append mode and closes it again; no handle
//! outlives a single record.

use std::fs::OpenOptions;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::error;
use crate::error::EngineError;
use crate::model::RunStats;
use crate::progress::RunClock;

/// Value written in `failed` when nothing was in flight.
pub const NOTHING_IN_FLIGHT: &str = "None";

/// One line of the backup log. All values are strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: String,
    pub status: String,
    pub elapsed: String,
    pub processed: String,
    pub added: String,
    pub updated: String,
    pub deleted: String,
    pub ignored: String,
    pub failed: String,
}

impl RunRecord {
    pub fn new(stats: &RunStats, clock: &RunClock) -> Self {
        RunRecord {
            timestamp: clock.timestamp(),
            status: stats.status.to_string(),
            elapsed: clock.elapsed_hms(),
            processed: stats.processed.to_string(),
            added: stats.added.to_string(),
            updated: stats.updated.to_string(),
            deleted: stats.deleted.to_string(),
            ignored: stats.ignored.to_string(),
            failed: stats
                .in_flight
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| NOTHING_IN_FLIGHT.to_string()),
        }
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), EngineError> {
    let to_err = |e| EngineError::JournalWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)?;
    writeln!(file, "{}", line).map_err(to_err)
}

/// The per-destination audit log.
#[derive(Debug, Clone)]
pub struct BackupLog {
    path: PathBuf,
}

impl BackupLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BackupLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &RunRecord) -> Result<(), EngineError> {
        append_line(&self.path, &serde_json::to_string(record)?)
    }
}

/// Sink for fatal messages, independent of the backup log.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ErrorLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append "[timestamp] message".
    pub fn record(&self, clock: &RunClock, message: &str) -> Result<(), EngineError> {
        append_line(&self.path, &format!("[{}] {}", clock.timestamp(), message))
    }
}

/// Holds the run statistics and guarantees the completion record is written.
///
/// Dereferences to `RunStats` so the differ and executor can update counters
/// through it. If the guard is dropped without `finish` (a panic unwinding
/// through diff or apply), the record is written from `Drop`.
pub struct CompletionGuard<'a> {
    log: BackupLog,
    clock: &'a RunClock,
    stats: RunStats,
    written: bool,
}

impl<'a> CompletionGuard<'a> {
    pub fn new(log: BackupLog, clock: &'a RunClock, stats: RunStats) -> Self {
        CompletionGuard {
            log,
            clock,
            stats,
            written: false,
        }
    }

    /// Write the completion record and hand back the final statistics.
    pub fn finish(mut self) -> (RunStats, Result<(), EngineError>) {
        self.written = true;
        let stats = std::mem::take(&mut self.stats);
        let result = self.log.append(&RunRecord::new(&stats, self.clock));
        (stats, result)
    }
}

impl Deref for CompletionGuard<'_> {
    type Target = RunStats;

    fn deref(&self) -> &RunStats {
        &self.stats
    }
}

impl DerefMut for CompletionGuard<'_> {
    fn deref_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if self.written {
            return;
        }
        self.written = true;
        if let Err(e) = self.log.append(&RunRecord::new(&self.stats, self.clock)) {
            error!(log = %self.log.path().display(), "Could not write completion record: {}", e);
        }
    }
}
