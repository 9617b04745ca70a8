//! Core data model for backup runs.
//!
//! This module defines the main data structures:
//! - SyncConfig: where to read from, where to write to, where to log errors
//! - Addition, Deletion, SyncPlan: the work lists produced by the differ
//! - RunStats, RunStatus: counters mutated during a run and persisted once
//! - RunOutcome: the externally distinguishable end state of a run

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Reserved name of the backup log kept in the destination root.
pub const BACKUP_LOG_NAME: &str = "backup_log.txt";

/// Configuration for a single backup run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root of the tree being mirrored
    pub source: PathBuf,

    /// Root of the mirror
    pub destination: PathBuf,

    /// Append-only file receiving fatal messages
    pub error_log: PathBuf,

    /// File name of the backup log inside the destination root
    pub backup_log_name: String,
}

impl SyncConfig {
    pub fn new<P, Q, R>(source: P, destination: Q, error_log: R) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
        R: Into<PathBuf>,
    {
        SyncConfig {
            source: source.into(),
            destination: destination.into(),
            error_log: error_log.into(),
            backup_log_name: BACKUP_LOG_NAME.to_string(),
        }
    }

    /// Use a different reserved backup log name.
    pub fn with_backup_log_name(mut self, name: impl Into<String>) -> Self {
        self.backup_log_name = name.into();
        self
    }

    /// Full path of the backup log.
    pub fn backup_log_path(&self) -> PathBuf {
        self.destination.join(&self.backup_log_name)
    }
}

/// Why an entry is being copied into the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionKind {
    /// Nothing exists at the destination path
    New,
    /// Second half of a replace; the destination entry was deleted first
    Replace,
}

/// Why an entry is being removed from the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionKind {
    /// Entry no longer exists in the source
    Remove,
    /// First half of a replace (content or type changed)
    Replace,
}

/// A source entry to copy to the matching destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: AdditionKind,
}

impl Addition {
    pub fn new(source: &Path, destination: &Path, kind: AdditionKind) -> Self {
        Addition {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            kind,
        }
    }
}

/// A destination entry to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub path: PathBuf,
    pub kind: DeletionKind,
}

impl Deletion {
    pub fn new(path: &Path, kind: DeletionKind) -> Self {
        Deletion {
            path: path.to_path_buf(),
            kind,
        }
    }
}

/// The two ordered work lists computed by the differ.
///
/// Deletions are always applied before additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub additions: Vec<Addition>,
    pub deletions: Vec<Deletion>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Ok => write!(f, "OK"),
            RunStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Counters and state of a run.
///
/// Created when the run starts, threaded by reference through the differ and
/// the executor, and written to the backup log exactly once.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Identifier used to correlate log lines of one run
    pub run_id: Uuid,

    /// Pairs visited by the differ
    pub processed: u64,

    /// Entries copied into the destination (new and replaced)
    pub added: u64,

    /// Entries copied as the second half of a replace
    pub updated: u64,

    /// Entries removed from the destination
    pub deleted: u64,

    /// File pairs found identical
    pub ignored: u64,

    /// Entry being mutated right now; left set if the mutation fails
    pub in_flight: Option<PathBuf>,

    /// Failed until the run completes without error
    pub status: RunStatus,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            run_id: Uuid::new_v4(),
            processed: 0,
            added: 0,
            updated: 0,
            deleted: 0,
            ignored: 0,
            in_flight: None,
            status: RunStatus::Failed,
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// How a run ended. Each variant maps to a distinct process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Sync finished and the completion record was written
    Completed,
    /// The backup log was found in the source root
    LogOnSource,
    /// The backup log was not found in the destination root
    LogMissingOnDestination,
    /// Diff or apply failed; the message is the error text
    Failed(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}
