//! Filesystem operations module.
//!
//! This module provides the low-level operations used by the differ and the
//! executor:
//! - Listing directory entries in the order the OS returns them
//! - Reading the type, size and modification time of an entry
//! - Copying files and directory trees with modification times preserved
//! - Removing files and directory trees
//!
//! Every failure is mapped to an `EngineError` carrying the failing path.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use filetime::FileTime;
use crate::error::EngineError;

/// Type, size and modification time of an entry, following symbolic links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl EntryStat {
    /// True if two files compare equal for sync purposes (same mtime and size).
    pub fn same_content_as(&self, other: &EntryStat) -> bool {
        self.len == other.len && self.modified == other.modified
    }
}

/// Read the type, size and modification time of `path`.
pub fn stat(path: &Path) -> Result<EntryStat, EngineError> {
    let metadata = fs::metadata(path).map_err(|e| EngineError::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(EntryStat {
        is_dir: metadata.is_dir(),
        len: metadata.len(),
        modified: metadata.modified().ok(),
    })
}

/// List the names of the entries of `dir`, in directory order.
///
/// # Errors
/// Returns EngineError::ListDirectory if the directory cannot be read.
pub fn list_names(dir: &Path) -> Result<Vec<OsString>, EngineError> {
    let to_err = |e: io::Error| EngineError::ListDirectory {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(to_err)? {
        names.push(entry.map_err(to_err)?.file_name());
    }
    Ok(names)
}

/// Remove a file, or a whole directory tree, at `path`.
///
/// Symbolic links are removed themselves; their targets are left alone.
pub fn remove_entry(path: &Path) -> Result<(), EngineError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| EngineError::Remove {
        path: path.to_path_buf(),
        source: e,
    })?;

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|e| EngineError::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy `src` to `dst`, recursing into directories.
///
/// # Returns
/// Number of file bytes copied
pub fn copy_entry(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    if stat(src)?.is_dir {
        copy_tree(src, dst)
    } else {
        copy_file_with_metadata(src, dst)
    }
}

/// Recursively copy the directory `src` to `dst`, which must not exist.
///
/// File and directory modification times are carried over. Directory times
/// are set after the directory is populated, since populating it changes
/// them.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let src_stat = stat(src)?;
    // Listed before `dst` exists so a target inside `src` is not copied into itself
    let names = list_names(src)?;

    fs::create_dir(dst).map_err(|e| EngineError::CreateDirectory {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let mut bytes = 0;
    for name in names {
        bytes += copy_entry(&src.join(&name), &dst.join(&name))?;
    }

    if let Some(mtime) = src_stat.modified {
        set_modified(dst, mtime)?;
    }

    Ok(bytes)
}

/// Copy a file from source to destination with metadata preservation.
///
/// Permission bits and the modification time are carried over; the latter
/// is what keeps the next comparison from flagging the file again.
///
/// # Returns
/// Number of bytes copied
///
/// # Errors
/// Returns EngineError if the copy fails
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    ensure_parent_dir_exists(dst)?;

    let src_mtime = stat(src)?.modified;

    let bytes_copied = fs::copy(src, dst).map_err(|e| EngineError::Copy {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;

    if let Some(mtime) = src_mtime {
        set_modified(dst, mtime)?;
    }

    Ok(bytes_copied)
}

fn set_modified(path: &Path, mtime: SystemTime) -> Result<(), EngineError> {
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).map_err(|e| {
        EngineError::SetModified {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Ensure the parent directory of a path exists, creating it if necessary.
///
/// # Errors
/// Returns EngineError if the parent exists but is not a directory, or if
/// creating it fails
pub fn ensure_parent_dir_exists(path: &Path) -> Result<(), EngineError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    match fs::metadata(parent) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::CreateDirectory {
            path: parent.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "Parent path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(parent).map_err(|e| EngineError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(EngineError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        }),
    }
}
