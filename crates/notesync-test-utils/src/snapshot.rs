//! [`SnapshotBuilder`]: provider snapshots written to disk.
//!
//! Builds a [`Snapshot`] and saves it as `snapshot.toml`, with each
//! resource's bytes stored next to it under `data/`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use notesync_core::remote::{Snapshot, SnapshotNote, SnapshotNotebook, SnapshotResource};

/// Accumulates notebooks, notes and attachments, then writes them out.
///
/// ```rust,no_run
/// use notesync_test_utils::SnapshotBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let snapshot = SnapshotBuilder::new()
///     .notebook("Receipts", Some("Finance"))
///     .note("Lunch", "2024-03-01T12:00:00Z")
///     .resource(Some("lunch.pdf"), "bytes")
///     .write(dir.path());
/// ```
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a notebook; following notes belong to it.
    pub fn notebook(mut self, name: &str, stack: Option<&str>) -> Self {
        self.snapshot.notebooks.push(SnapshotNotebook {
            name: name.to_string(),
            stack: stack.map(str::to_string),
            notes: Vec::new(),
        });
        self
    }

    /// Start a note in the current notebook. `updated` is RFC 3339.
    ///
    /// # Panics
    /// Panics if no notebook was started or `updated` does not parse.
    pub fn note(mut self, title: &str, updated: &str) -> Self {
        let updated = DateTime::parse_from_rfc3339(updated)
            .unwrap_or_else(|e| panic!("SnapshotBuilder: bad timestamp {updated:?}: {e}"))
            .with_timezone(&Utc);
        self.current_notebook().notes.push(SnapshotNote {
            title: title.to_string(),
            updated,
            resources: Vec::new(),
        });
        self
    }

    /// Attach `content` to the current note.
    ///
    /// # Panics
    /// Panics if no note was started.
    pub fn resource(mut self, file_name: Option<&str>, content: impl AsRef<[u8]>) -> Self {
        let data_path = PathBuf::from(format!("data/{}.bin", self.files.len()));
        let note = self
            .current_notebook()
            .notes
            .last_mut()
            .unwrap_or_else(|| panic!("SnapshotBuilder: resource added before any note"));
        note.resources.push(SnapshotResource {
            file_name: file_name.map(str::to_string),
            path: data_path.clone(),
            hash: None,
        });
        self.files.push((data_path, content.as_ref().to_vec()));
        self
    }

    /// The snapshot as it will be written.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Write `snapshot.toml` and its data files into `dir`.
    ///
    /// # Panics
    /// Panics if any file cannot be written.
    pub fn write(&self, dir: &Path) -> PathBuf {
        for (relative, content) in &self.files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!("SnapshotBuilder: failed to create {}: {e}", parent.display())
                });
            }
            fs::write(&path, content).unwrap_or_else(|e| {
                panic!("SnapshotBuilder: failed to write {}: {e}", path.display())
            });
        }

        let path = dir.join("snapshot.toml");
        self.snapshot.save(&path).unwrap_or_else(|e| {
            panic!("SnapshotBuilder: failed to write {}: {e}", path.display())
        });
        path
    }

    fn current_notebook(&mut self) -> &mut SnapshotNotebook {
        self.snapshot
            .notebooks
            .last_mut()
            .unwrap_or_else(|| panic!("SnapshotBuilder: note added before any notebook"))
    }
}
