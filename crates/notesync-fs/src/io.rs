//! Filesystem mutations used when applying a plan
//!
//! Every function reports failures as [`Error::Io`] carrying the path that
//! failed, so callers can log the location without extra bookkeeping.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use filetime::FileTime;
use fs2::FileExt;

use crate::{Error, IdentityPath, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file,
/// and replaces any previous content entirely.
pub fn write_atomic(path: &IdentityPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let result = write_locked(&temp_path, &native_path, content).and_then(|()| {
        fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_locked(temp_path: &Path, native_path: &Path, content: &[u8]) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })?;

    temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all())
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })
}

/// Set the modification time of an existing entry.
pub fn set_modified(path: &IdentityPath, modified_at: DateTime<Utc>) -> Result<()> {
    let native_path = path.to_native();
    let mtime = FileTime::from_unix_time(
        modified_at.timestamp(),
        modified_at.timestamp_subsec_nanos(),
    );
    filetime::set_file_mtime(&native_path, mtime).map_err(|e| Error::io(&native_path, e))
}

/// Remove a regular file.
pub fn remove_file(path: &IdentityPath) -> Result<()> {
    let native_path = path.to_native();
    fs::remove_file(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Remove a directory. Fails if the directory is not empty.
pub fn remove_empty_dir(path: &IdentityPath) -> Result<()> {
    let native_path = path.to_native();
    fs::remove_dir(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &IdentityPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
