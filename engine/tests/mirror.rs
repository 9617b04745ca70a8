//! End-to-end runs against real temporary trees.

use std::fs;
use std::path::{Path, PathBuf};
use engine::{
    fs_ops, plan_sync, run_backup_with, AdditionKind, DotPrefixClassifier, RunOutcome, RunRecord,
    RunStats, SyncConfig, BACKUP_LOG_NAME,
};
use filetime::FileTime;

struct Workspace {
    _temp: tempfile::TempDir,
    config: SyncConfig,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp.path().join("source");
        let dst = temp.path().join("mirror");
        fs::create_dir(&src).expect("Failed to create source");
        fs::create_dir(&dst).expect("Failed to create mirror");
        fs::write(dst.join(BACKUP_LOG_NAME), b"").expect("Failed to create backup log");
        let config = SyncConfig::new(&src, &dst, temp.path().join("errors.txt"));
        Workspace { _temp: temp, config }
    }

    fn src(&self, rel: &str) -> PathBuf {
        self.config.source.join(rel)
    }

    fn dst(&self, rel: &str) -> PathBuf {
        self.config.destination.join(rel)
    }

    fn run(&self) -> RunOutcome {
        run_backup_with(&self.config, &DotPrefixClassifier, None)
    }

    fn records(&self) -> Vec<RunRecord> {
        fs::read_to_string(self.config.backup_log_path())
            .expect("Failed to read backup log")
            .lines()
            .map(|line| serde_json::from_str(line).expect("Failed to parse record"))
            .collect()
    }
}

fn write(path: &Path, contents: &[u8], mtime: i64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

/// Every non-hidden source entry has a matching destination entry.
fn assert_mirrored(src: &Path, dst: &Path, root: bool) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name();
        if root && name.to_string_lossy().starts_with('.') {
            continue;
        }
        let s = fs_ops::stat(&src.join(&name)).unwrap();
        let d = fs_ops::stat(&dst.join(&name))
            .unwrap_or_else(|_| panic!("{:?} missing from mirror", name));
        assert_eq!(s.is_dir, d.is_dir, "type differs for {:?}", name);
        if s.is_dir {
            assert_mirrored(&src.join(&name), &dst.join(&name), false);
        } else {
            assert!(s.same_content_as(&d), "content differs for {:?}", name);
        }
    }
}

#[test]
fn test_mirror_is_complete_and_idempotent() {
    let ws = Workspace::new();
    write(&ws.src("a.txt"), b"alpha", 1_000);
    write(&ws.src("music/album/01.flac"), b"track one", 2_000);
    write(&ws.src("music/album/02.flac"), b"track two", 2_000);
    write(&ws.src("docs/.hidden-but-nested"), b"kept", 3_000);
    write(&ws.dst("music/album/01.flac"), b"old", 500);
    write(&ws.dst("music/album/03.flac"), b"removed", 500);
    write(&ws.dst("leftover/x.bin"), b"x", 500);

    assert_eq!(ws.run(), RunOutcome::Completed);
    assert_mirrored(&ws.config.source, &ws.config.destination, true);
    assert!(!ws.dst("music/album/03.flac").exists());
    assert!(!ws.dst("leftover").exists());
    assert!(ws.dst("docs/.hidden-but-nested").exists());

    let mut stats = RunStats::new();
    let plan = plan_sync(&ws.config, &DotPrefixClassifier, &mut stats).unwrap();
    assert!(plan.is_empty(), "second pass not empty: {:?}", plan);

    assert_eq!(ws.run(), RunOutcome::Completed);
    let records = ws.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, "OK");
    assert_eq!(records[1].added, "0");
    assert_eq!(records[1].deleted, "0");
}

#[test]
fn test_notes_example() {
    let ws = Workspace::new();
    write(&ws.src("notes.txt"), b"notes, now longer", 2_000);
    write(&ws.dst("notes.txt"), b"notes", 1_000);
    write(&ws.dst("old.log"), b"old", 1_000);

    let mut stats = RunStats::new();
    let plan = plan_sync(&ws.config, &DotPrefixClassifier, &mut stats).unwrap();

    let mut deletions: Vec<_> = plan.deletions.iter().map(|d| d.path.clone()).collect();
    deletions.sort();
    assert_eq!(deletions, vec![ws.dst("notes.txt"), ws.dst("old.log")]);
    assert_eq!(plan.additions.len(), 1);
    assert_eq!(plan.additions[0].source, ws.src("notes.txt"));
    assert_eq!(plan.additions[0].destination, ws.dst("notes.txt"));
    assert_eq!(plan.additions[0].kind, AdditionKind::Replace);

    assert_eq!(ws.run(), RunOutcome::Completed);
    assert!(!ws.dst("old.log").exists());
    assert_eq!(fs::read(ws.dst("notes.txt")).unwrap(), b"notes, now longer");

    let record = &ws.records()[0];
    assert_eq!(record.added, "1");
    assert_eq!(record.updated, "1");
    assert_eq!(record.deleted, "2");
}

#[test]
fn test_hidden_root_entry_not_added_but_nested_one_is() {
    let ws = Workspace::new();
    write(&ws.src(".Spotlight-V100/store.db"), b"index", 1_000);
    write(&ws.src("photos/.Spotlight-V100/store.db"), b"index", 1_000);
    write(&ws.dst(".fseventsd/log"), b"device", 1_000);

    assert_eq!(ws.run(), RunOutcome::Completed);

    assert!(!ws.dst(".Spotlight-V100").exists());
    assert!(ws.dst("photos/.Spotlight-V100/store.db").exists());
    assert!(ws.dst(".fseventsd/log").exists());
}

#[test]
fn test_backup_log_is_never_touched() {
    let ws = Workspace::new();
    fs::write(ws.config.backup_log_path(), b"previous run\n").unwrap();
    write(&ws.src("file.txt"), b"x", 1_000);

    let mut stats = RunStats::new();
    let plan = plan_sync(&ws.config, &DotPrefixClassifier, &mut stats).unwrap();
    assert!(plan.deletions.iter().all(|d| d.path != ws.config.backup_log_path()));
    assert!(plan.additions.iter().all(|a| a.destination != ws.config.backup_log_path()));

    assert_eq!(ws.run(), RunOutcome::Completed);
    let contents = fs::read_to_string(ws.config.backup_log_path()).unwrap();
    assert!(contents.starts_with("previous run\n"));
    assert_eq!(contents.lines().count(), 2);
}

#[test]
fn test_safety_gates_prevent_mutation() {
    let ws = Workspace::new();
    write(&ws.src("new.txt"), b"new", 1_000);
    write(&ws.dst("keep.txt"), b"keep", 1_000);
    fs::write(ws.src(BACKUP_LOG_NAME), b"").unwrap();

    assert_eq!(ws.run(), RunOutcome::LogOnSource);
    assert!(ws.dst("keep.txt").exists());
    assert!(!ws.dst("new.txt").exists());

    fs::remove_file(ws.src(BACKUP_LOG_NAME)).unwrap();
    fs::remove_file(ws.config.backup_log_path()).unwrap();

    assert_eq!(ws.run(), RunOutcome::LogMissingOnDestination);
    assert!(ws.dst("keep.txt").exists());
    assert!(!ws.dst("new.txt").exists());

    let errors = fs::read_to_string(&ws.config.error_log).unwrap();
    assert_eq!(errors.lines().count(), 2);
}
