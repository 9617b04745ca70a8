//! Sync execution.
//!
//! Applies a `SyncPlan` in two phases: every deletion, in order, then every
//! addition, in order. Removing first means a replace whose entry changed
//! type never collides with the old entry at the same path.
//!
//! The entry being mutated is recorded in `RunStats::in_flight` before the
//! mutation and cleared after it, so a failure leaves it pointing at the
//! first item that did not make it.

use std::path::Path;
use tracing::debug;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{Addition, AdditionKind, Deletion, RunStats, SyncPlan};
use crate::progress::{ProgressCallback, RunClock};

/// Apply `plan` to the destination tree.
///
/// # Errors
/// Stops at the first failing item; nothing is retried.
pub fn apply_plan(
    plan: &SyncPlan,
    stats: &mut RunStats,
    clock: &RunClock,
    progress: Option<&dyn ProgressCallback>,
) -> Result<(), EngineError> {
    for deletion in &plan.deletions {
        if let Some(callback) = progress {
            callback.on_deletion(clock, deletion);
        }
        delete(deletion, stats)?;
    }

    for addition in &plan.additions {
        if let Some(callback) = progress {
            callback.on_addition(clock, addition);
        }
        add(addition, stats)?;
    }

    Ok(())
}

/// Remove a destination entry, whole trees in one go.
pub fn delete(deletion: &Deletion, stats: &mut RunStats) -> Result<(), EngineError> {
    track(stats, &deletion.path, fs_ops::remove_entry)?;
    stats.deleted += 1;
    Ok(())
}

/// Copy a source entry to its destination path.
pub fn add(addition: &Addition, stats: &mut RunStats) -> Result<(), EngineError> {
    let bytes = track(stats, &addition.destination, |dst| {
        fs_ops::copy_entry(&addition.source, dst)
    })?;
    debug!(path = %addition.destination.display(), bytes, "Copied");

    stats.added += 1;
    if addition.kind == AdditionKind::Replace {
        stats.updated += 1;
    }
    Ok(())
}

fn track<T>(
    stats: &mut RunStats,
    path: &Path,
    op: impl FnOnce(&Path) -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    stats.in_flight = Some(path.to_path_buf());
    let value = op(path)?;
    stats.in_flight = None;
    Ok(value)
}
