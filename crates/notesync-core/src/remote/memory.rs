//! In-memory note store, optionally loaded from a snapshot file

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use notesync_fs::{ConfigStore, IdentityPath, fingerprint_bytes, fingerprint_file};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{Note, NoteStore, Notebook, NotesPage, Resource};
use crate::{Error, Result};

/// A snapshot of a provider's notebooks, as stored on disk.
///
/// ```toml
/// [[notebooks]]
/// name = "Receipts"
/// stack = "Finance"
///
/// [[notebooks.notes]]
/// title = "Lunch"
/// updated = "2024-03-01T12:00:00Z"
///
/// [[notebooks.notes.resources]]
/// file_name = "lunch.pdf"
/// path = "data/lunch.pdf"
/// ```
///
/// Resource paths are relative to the snapshot file. A missing `hash` is
/// computed from the referenced file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub notebooks: Vec<SnapshotNotebook>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNotebook {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub notes: Vec<SnapshotNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNote {
    pub title: String,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub resources: Vec<SnapshotResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Snapshot {
    /// Read a snapshot; the format follows the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load(&IdentityPath::new(path))?)
    }

    /// Write the snapshot; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(ConfigStore::new().save(&IdentityPath::new(path), self)?)
    }
}

#[derive(Debug)]
enum ResourceData {
    Inline(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug)]
struct StoredNote {
    notebook_guid: String,
    note: Note,
}

/// A [`NoteStore`] kept entirely in memory.
///
/// Guids are random. Every successful or failed `fetch_resource` call is
/// counted, which lets callers check that content is only read on demand.
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notebooks: Vec<Notebook>,
    notes: Vec<StoredNote>,
    data: HashMap<String, ResourceData>,
    fetches: AtomicUsize,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a TOML, JSON or YAML snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot cannot be parsed, or if a resource without a
    /// recorded hash references an unreadable file.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let snapshot = Snapshot::load(path)?;
        let base = path.parent().unwrap_or(Path::new(""));
        Self::from_snapshot(snapshot, base)
    }

    /// Build a store from a parsed snapshot, resolving resource paths
    /// against `base`.
    pub fn from_snapshot(snapshot: Snapshot, base: &Path) -> Result<Self> {
        let mut store = Self::new();
        for notebook in snapshot.notebooks {
            let notebook_guid = store.add_notebook(&notebook.name, notebook.stack.as_deref());
            for note in notebook.notes {
                let note_guid = store.add_note(&notebook_guid, &note.title, note.updated)?;
                for resource in note.resources {
                    let file = base.join(&resource.path);
                    let hash = match resource.hash {
                        Some(hash) => hash,
                        None => fingerprint_file(&file).map_err(|source| Error::Snapshot {
                            path: file.clone(),
                            source,
                        })?,
                    };
                    store.insert_resource(
                        &note_guid,
                        resource.file_name,
                        hash,
                        ResourceData::File(file),
                    )?;
                }
            }
        }
        debug!(
            notebooks = store.notebooks.len(),
            notes = store.notes.len(),
            resources = store.data.len(),
            "Loaded snapshot"
        );
        Ok(store)
    }

    /// Add a notebook and return its guid.
    pub fn add_notebook(&mut self, name: &str, stack: Option<&str>) -> String {
        let guid = Uuid::new_v4().to_string();
        self.notebooks.push(Notebook {
            guid: guid.clone(),
            name: name.to_string(),
            stack: stack.map(str::to_string),
        });
        guid
    }

    /// Add an empty note to a notebook and return its guid.
    pub fn add_note(
        &mut self,
        notebook_guid: &str,
        title: &str,
        updated: DateTime<Utc>,
    ) -> Result<String> {
        if !self.notebooks.iter().any(|n| n.guid == notebook_guid) {
            return Err(Error::InvalidConfig {
                message: format!("unknown notebook guid {}", notebook_guid),
            });
        }
        let guid = Uuid::new_v4().to_string();
        self.notes.push(StoredNote {
            notebook_guid: notebook_guid.to_string(),
            note: Note {
                guid: guid.clone(),
                title: title.to_string(),
                updated,
                resources: Vec::new(),
            },
        });
        Ok(guid)
    }

    /// Attach `data` to a note and return the resource guid.
    ///
    /// The body hash is computed from `data`.
    pub fn add_resource(
        &mut self,
        note_guid: &str,
        file_name: Option<&str>,
        data: impl Into<Vec<u8>>,
    ) -> Result<String> {
        let data = data.into();
        let hash = fingerprint_bytes(&data);
        self.insert_resource(
            note_guid,
            file_name.map(str::to_string),
            hash,
            ResourceData::Inline(data),
        )
    }

    /// Number of `fetch_resource` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn insert_resource(
        &mut self,
        note_guid: &str,
        file_name: Option<String>,
        body_hash: String,
        data: ResourceData,
    ) -> Result<String> {
        let stored = self
            .notes
            .iter_mut()
            .find(|stored| stored.note.guid == note_guid)
            .ok_or_else(|| Error::InvalidConfig {
                message: format!("unknown note guid {}", note_guid),
            })?;

        let guid = Uuid::new_v4().to_string();
        stored.note.resources.push(Resource {
            guid: guid.clone(),
            file_name,
            body_hash,
        });
        self.data.insert(guid.clone(), data);
        Ok(guid)
    }
}

impl NoteStore for MemoryNoteStore {
    fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        Ok(self.notebooks.clone())
    }

    fn find_notes(&self, notebook_guid: &str, offset: usize, max: usize) -> Result<NotesPage> {
        let in_notebook: Vec<&Note> = self
            .notes
            .iter()
            .filter(|stored| stored.notebook_guid == notebook_guid)
            .map(|stored| &stored.note)
            .collect();

        Ok(NotesPage {
            total: in_notebook.len(),
            notes: in_notebook.into_iter().skip(offset).take(max).cloned().collect(),
        })
    }

    fn fetch_resource(&self, resource_guid: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.data.get(resource_guid) {
            Some(ResourceData::Inline(bytes)) => Ok(bytes.clone()),
            Some(ResourceData::File(path)) => std::fs::read(path).map_err(|source| Error::Snapshot {
                path: path.clone(),
                source,
            }),
            None => Err(Error::remote(format!("unknown resource guid {}", resource_guid))),
        }
    }
}
