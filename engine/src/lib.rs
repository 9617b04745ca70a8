//! # BackUP Engine - Incremental Mirror Library
//!
//! A one-directional, incremental directory synchronizer. Given a source
//! tree and a destination tree, the engine computes the mutations needed for
//! the destination to mirror the source and applies them.
//!
//! ## Overview
//!
//! - Files are compared by modification time and size only
//! - Changed files and file/directory type changes are replaced wholesale
//! - Hidden entries directly under the roots are ignored
//! - A sentinel backup log in the destination root guards against syncing
//!   into the wrong folder or with source and destination swapped
//! - Every run appends one completion record to the backup log, even when
//!   it fails halfway
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{run_backup, RunOutcome, SyncConfig};
//!
//! let config = SyncConfig::new("/data", "/mnt/backup", "/var/log/backup-errors.txt");
//! match run_backup(&config, None) {
//!     RunOutcome::Completed => println!("Mirror is up to date"),
//!     other => eprintln!("Backup did not complete: {:?}", other),
//! }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (SyncConfig, SyncPlan, RunStats, enums)
//! - **error**: Error types and handling
//! - **hidden**: Platform-specific hidden-entry detection
//! - **fs_ops**: Low-level filesystem operations
//! - **diff**: Tree comparison producing the work lists
//! - **apply**: Executes the work lists
//! - **journal**: Backup log, error log and the completion guard
//! - **job**: Run orchestration (safety checks, diff, apply, record)
//! - **progress**: Run clock and progress callback trait

pub mod model;
pub mod error;
pub mod hidden;
pub mod fs_ops;
pub mod diff;
pub mod apply;
pub mod journal;
pub mod job;
pub mod progress;

// Re-export main types and functions
pub use model::{
    Addition, AdditionKind, Deletion, DeletionKind, RunOutcome, RunStats, RunStatus, SyncConfig,
    SyncPlan, BACKUP_LOG_NAME,
};
pub use error::EngineError;
pub use hidden::{platform_classifier, DotPrefixClassifier, HiddenClassifier};
pub use diff::Differ;
pub use apply::apply_plan;
pub use journal::{BackupLog, ErrorLog, RunRecord};
pub use job::{describe_outcome, plan_sync, run_backup, run_backup_with};
pub use progress::{ProgressCallback, RunClock};
