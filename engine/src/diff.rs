//! Tree comparison.
//!
//! Walks the source and destination trees side by side and produces the
//! work lists that make the destination mirror the source:
//! - file pairs whose size or modification time differ are replaced
//! - file/directory type changes are replaced wholesale, without descending
//! - source-only entries are added, destination-only entries are removed
//!
//! Hidden entries directly under the roots are left out entirely. The
//! reserved backup log name is never proposed for removal.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use tracing::debug;
use crate::error::EngineError;
use crate::fs_ops;
use crate::hidden::HiddenClassifier;
use crate::model::{Addition, AdditionKind, Deletion, DeletionKind, RunStats, SyncPlan};

/// Compares a source tree against a destination tree.
pub struct Differ<'a> {
    classifier: &'a dyn HiddenClassifier,
    reserved_name: &'a OsStr,
}

impl<'a> Differ<'a> {
    /// `reserved_name` is the backup log file name, never deleted.
    pub fn new(classifier: &'a dyn HiddenClassifier, reserved_name: &'a str) -> Self {
        Differ {
            classifier,
            reserved_name: OsStr::new(reserved_name),
        }
    }

    /// Compute the work lists for mirroring `source` onto `destination`.
    ///
    /// Counters in `stats` are updated as pairs are visited.
    ///
    /// # Errors
    /// Any failure to list a directory or read metadata aborts the walk.
    pub fn diff(
        &self,
        source: &Path,
        destination: &Path,
        stats: &mut RunStats,
    ) -> Result<SyncPlan, EngineError> {
        let mut plan = SyncPlan::default();
        self.compare_pair(source, destination, 0, &mut plan, stats)?;
        Ok(plan)
    }

    fn compare_pair(
        &self,
        src: &Path,
        dst: &Path,
        depth: usize,
        plan: &mut SyncPlan,
        stats: &mut RunStats,
    ) -> Result<(), EngineError> {
        stats.processed += 1;

        if depth == 1 && (self.classifier.is_hidden(src) || self.classifier.is_hidden(dst)) {
            debug!(path = %src.display(), "Skipping hidden root entry");
            return Ok(());
        }

        let src_stat = fs_ops::stat(src)?;
        let dst_stat = fs_ops::stat(dst)?;

        match (src_stat.is_dir, dst_stat.is_dir) {
            (false, false) => {
                if src_stat.same_content_as(&dst_stat) {
                    stats.ignored += 1;
                } else {
                    debug!(path = %dst.display(), "File changed");
                    replace(src, dst, plan);
                }
                Ok(())
            }
            (true, true) => self.compare_dirs(src, dst, depth, plan, stats),
            _ => {
                debug!(path = %dst.display(), "Entry type changed");
                replace(src, dst, plan);
                Ok(())
            }
        }
    }

    fn compare_dirs(
        &self,
        src: &Path,
        dst: &Path,
        depth: usize,
        plan: &mut SyncPlan,
        stats: &mut RunStats,
    ) -> Result<(), EngineError> {
        let src_names = fs_ops::list_names(src)?;
        let dst_names = fs_ops::list_names(dst)?;

        let src_set: HashSet<&OsString> = src_names.iter().collect();
        let dst_set: HashSet<&OsString> = dst_names.iter().collect();
        let at_root = depth == 0;

        // In both trees
        for name in src_names.iter().filter(|n| dst_set.contains(n)) {
            self.compare_pair(&src.join(name), &dst.join(name), depth + 1, plan, stats)?;
        }

        // Only in source
        for name in src_names.iter().filter(|n| !dst_set.contains(n)) {
            stats.processed += 1;
            let src_child = src.join(name);
            if at_root && self.classifier.is_hidden(&src_child) {
                debug!(path = %src_child.display(), "Skipping hidden root entry");
                continue;
            }
            plan.additions
                .push(Addition::new(&src_child, &dst.join(name), AdditionKind::New));
        }

        // Only in destination
        for name in dst_names.iter().filter(|n| !src_set.contains(n)) {
            if name.as_os_str() == self.reserved_name {
                continue;
            }
            stats.processed += 1;
            let dst_child = dst.join(name);
            if at_root && self.classifier.is_hidden(&dst_child) {
                debug!(path = %dst_child.display(), "Skipping hidden root entry");
                continue;
            }
            plan.deletions.push(Deletion::new(&dst_child, DeletionKind::Remove));
        }

        Ok(())
    }
}

fn replace(src: &Path, dst: &Path, plan: &mut SyncPlan) {
    plan.deletions.push(Deletion::new(dst, DeletionKind::Replace));
    plan.additions.push(Addition::new(src, dst, AdditionKind::Replace));
}
