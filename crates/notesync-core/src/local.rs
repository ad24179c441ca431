//! Current state: items for everything below a local root

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notesync_fs::{EMPTY_FINGERPRINT, IdentityPath, fingerprint_file};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::item::{ContentSource, Item};
use crate::item_set::ItemSet;
use crate::{Error, Result};

/// Reads a local file when an operation needs its bytes.
///
/// Anything that is not a regular file at read time yields no bytes.
#[derive(Debug, Clone)]
pub struct FileContent {
    path: PathBuf,
}

impl FileContent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContentSource for FileContent {
    fn read(&self) -> Result<Vec<u8>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        std::fs::read(&self.path).map_err(|e| Error::Content {
            location: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Build the current state for `root`.
///
/// Every file and directory below `root` becomes an item whose identity path
/// is relative to `root`; `root` itself is not included. Symlinks are
/// followed. Entries that cannot be listed, inspected or hashed are logged
/// and skipped. A missing root yields an empty set.
pub fn scan_directory(root: &Path) -> ItemSet {
    let mut items = ItemSet::new();
    if !root.exists() {
        debug!(root = %root.display(), "Local root does not exist yet");
        return items;
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Could not traverse entry. Check permission");
                continue;
            }
        };

        match item_for(root, &entry) {
            Ok(item) => {
                items.add(item);
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
            }
        }
    }

    debug!(root = %root.display(), count = items.len(), "Scanned local directory");
    items
}

fn item_for(root: &Path, entry: &DirEntry) -> Result<Item> {
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    let path = IdentityPath::empty().append(relative.to_string_lossy());

    let metadata = entry.metadata().map_err(|e| Error::Content {
        location: entry.path().display().to_string(),
        message: e.to_string(),
    })?;
    let modified_at: DateTime<Utc> = metadata.modified()?.into();

    let fingerprint = if metadata.is_file() {
        fingerprint_file(entry.path())?
    } else {
        EMPTY_FINGERPRINT.to_string()
    };

    Ok(Item::new(
        path,
        fingerprint,
        modified_at,
        Arc::new(FileContent::new(entry.path())),
    ))
}
