//! Run orchestration.
//!
//! A run goes through these steps:
//! - Safety checks: the backup log must be absent from the source root and
//!   present in the destination root, otherwise nothing is touched
//! - Diff: compute the deletions and additions
//! - Apply: deletions first, then additions
//! - Completion record: appended to the backup log whatever happened during
//!   diff and apply
//!
//! Failures are reported through the returned `RunOutcome`, the error log
//! and tracing; they are not returned as `Err`.

use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, info_span, warn};
use crate::apply::apply_plan;
use crate::diff::Differ;
use crate::error::EngineError;
use crate::fs_ops;
use crate::hidden::{self, HiddenClassifier};
use crate::journal::{BackupLog, CompletionGuard, ErrorLog};
use crate::model::{RunOutcome, RunStats, RunStatus, SyncConfig, SyncPlan};
use crate::progress::{ProgressCallback, RunClock};

/// Run one backup with the host platform's hidden-item rules.
pub fn run_backup(config: &SyncConfig, progress: Option<&dyn ProgressCallback>) -> RunOutcome {
    let classifier = hidden::platform_classifier();
    run_backup_with(config, classifier.as_ref(), progress)
}

/// Run one backup with an explicit hidden-item classifier.
pub fn run_backup_with(
    config: &SyncConfig,
    classifier: &dyn HiddenClassifier,
    progress: Option<&dyn ProgressCallback>,
) -> RunOutcome {
    let clock = RunClock::start();
    let stats = RunStats::new();
    let span = info_span!("backup", run = %stats.run_id);
    let _enter = span.enter();

    let error_log = ErrorLog::new(&config.error_log);

    if let Some(callback) = progress {
        callback.on_run_started(&clock, config);
    }
    info!(
        source = %config.source.display(),
        destination = %config.destination.display(),
        "Starting backup on {}",
        clock.timestamp()
    );

    if let Err(outcome) = check_safety(config) {
        let message = describe_outcome(&outcome, config);
        warn!("{}", message);
        record_error(&error_log, &clock, &message);
        if let Some(callback) = progress {
            callback.on_run_completed(&clock, &stats, &outcome);
        }
        return outcome;
    }

    let mut guard = CompletionGuard::new(BackupLog::new(config.backup_log_path()), &clock, stats);

    let outcome = match sync(config, classifier, &clock, &mut guard, progress) {
        Ok(()) => {
            guard.status = RunStatus::Ok;
            RunOutcome::Completed
        }
        Err(e) => {
            let outcome = RunOutcome::Failed(e.to_string());
            let message = describe_outcome(&outcome, config);
            error!(in_flight = ?guard.in_flight, os_error = ?e.raw_os_error(), "{}", message);
            record_error(&error_log, &clock, &message);
            outcome
        }
    };

    let (stats, written) = guard.finish();
    if let Err(e) = written {
        error!("Could not write completion record: {}", e);
    }

    info!(
        status = %stats.status,
        processed = stats.processed,
        added = stats.added,
        updated = stats.updated,
        deleted = stats.deleted,
        ignored = stats.ignored,
        elapsed = %clock.elapsed_hms(),
        "Backup finished"
    );

    if let Some(callback) = progress {
        callback.on_run_completed(&clock, &stats, &outcome);
    }

    outcome
}

/// Compute the work lists for `config` without touching anything.
pub fn plan_sync(
    config: &SyncConfig,
    classifier: &dyn HiddenClassifier,
    stats: &mut RunStats,
) -> Result<SyncPlan, EngineError> {
    Differ::new(classifier, &config.backup_log_name).diff(
        &config.source,
        &config.destination,
        stats,
    )
}

fn sync(
    config: &SyncConfig,
    classifier: &dyn HiddenClassifier,
    clock: &RunClock,
    stats: &mut RunStats,
    progress: Option<&dyn ProgressCallback>,
) -> Result<(), EngineError> {
    let plan = plan_sync(config, classifier, stats)?;
    info!(
        additions = plan.additions.len(),
        deletions = plan.deletions.len(),
        "Computed sync plan"
    );
    if let Some(callback) = progress {
        callback.on_plan_ready(clock, &plan);
    }

    apply_plan(&plan, stats, clock, progress)
}

/// Check the backup log placement before anything is mutated.
fn check_safety(config: &SyncConfig) -> Result<(), RunOutcome> {
    if contains_backup_log(config, &config.source)? {
        return Err(RunOutcome::LogOnSource);
    }
    if !contains_backup_log(config, &config.destination)? {
        return Err(RunOutcome::LogMissingOnDestination);
    }
    Ok(())
}

fn contains_backup_log(config: &SyncConfig, root: &Path) -> Result<bool, RunOutcome> {
    let names = fs_ops::list_names(root).map_err(|e| RunOutcome::Failed(e.to_string()))?;
    let reserved = OsStr::new(&config.backup_log_name);
    Ok(names.iter().any(|name| name.as_os_str() == reserved))
}

/// The line written to the error log for a non-successful outcome.
pub fn describe_outcome(outcome: &RunOutcome, config: &SyncConfig) -> String {
    match outcome {
        RunOutcome::Completed => "Finished backup".to_string(),
        RunOutcome::LogOnSource => {
            format!("Backup log found on source folder: {}", config.source.display())
        }
        RunOutcome::LogMissingOnDestination => format!(
            "Backup log not found on destination folder: {}",
            config.destination.display()
        ),
        RunOutcome::Failed(message) => format!("Unknown exception: {}", message),
    }
}

fn record_error(error_log: &ErrorLog, clock: &RunClock, message: &str) {
    if let Err(e) = error_log.record(clock, message) {
        error!("Could not write error log: {}", e);
    }
}
