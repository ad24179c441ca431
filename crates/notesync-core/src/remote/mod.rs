//! Desired state: items for attachments held by a note provider
//!
//! The provider is reached through the [`NoteStore`] trait. Notebooks are
//! listed once; notes are paged lazily through [`NotePages`]; attachment
//! bytes are only fetched when an operation reads them.
//!
//! Identity paths look like `stack/notebook/title.ext` for notes with one
//! attachment and `stack/notebook/title/file_name` for notes with several.

mod memory;

pub use memory::{
    MemoryNoteStore, Snapshot, SnapshotNote, SnapshotNotebook, SnapshotResource,
};

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notesync_fs::IdentityPath;
use tracing::{debug, info, warn};

use crate::item::{ContentSource, Item};
use crate::item_set::ItemSet;
use crate::{Error, Result};

/// Number of notes requested per page.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notebook {
    pub guid: String,
    pub name: String,
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub guid: String,
    pub title: String,
    pub updated: DateTime<Utc>,
    pub resources: Vec<Resource>,
}

/// An attachment of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub guid: String,
    pub file_name: Option<String>,
    /// Provider-computed MD5 of the attachment body, lowercase hex
    pub body_hash: String,
}

/// One page of a notebook's notes.
#[derive(Debug, Clone, Default)]
pub struct NotesPage {
    pub notes: Vec<Note>,
    /// Number of notes in the notebook across all pages, as reported by the
    /// store. Not used to decide when paging ends.
    pub total: usize,
}

/// Access to a note provider.
///
/// Errors from any method mean the provider is unusable; callers treat them
/// as fatal before planning starts, except for `fetch_resource`, whose
/// failures surface inside the operation that needed the bytes.
pub trait NoteStore: Send + Sync {
    fn list_notebooks(&self) -> Result<Vec<Notebook>>;

    fn find_notes(&self, notebook_guid: &str, offset: usize, max: usize) -> Result<NotesPage>;

    fn fetch_resource(&self, resource_guid: &str) -> Result<Vec<u8>>;
}

/// Lazily pages through the notes of one notebook.
///
/// Finite: stops after a page shorter than [`PAGE_SIZE`] or after yielding
/// the first error.
pub struct NotePages<'a> {
    store: &'a dyn NoteStore,
    notebook_guid: &'a str,
    offset: usize,
    buffer: VecDeque<Note>,
    done: bool,
}

impl<'a> NotePages<'a> {
    pub fn new(store: &'a dyn NoteStore, notebook_guid: &'a str) -> Self {
        Self {
            store,
            notebook_guid,
            offset: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }
}

impl Iterator for NotePages<'_> {
    type Item = Result<Note>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(note) = self.buffer.pop_front() {
                return Some(Ok(note));
            }
            if self.done {
                return None;
            }

            match self.store.find_notes(self.notebook_guid, self.offset, PAGE_SIZE) {
                Ok(page) => {
                    let count = page.notes.len();
                    self.offset += count;
                    // `total` is informational; only a short page ends the notebook
                    self.done = count < PAGE_SIZE;
                    self.buffer.extend(page.notes);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Fetches an attachment from the store on demand.
pub struct RemoteContent {
    store: Arc<dyn NoteStore>,
    resource_guid: String,
}

impl RemoteContent {
    pub fn new(store: Arc<dyn NoteStore>, resource_guid: impl Into<String>) -> Self {
        Self {
            store,
            resource_guid: resource_guid.into(),
        }
    }
}

impl ContentSource for RemoteContent {
    fn read(&self) -> Result<Vec<u8>> {
        self.store.fetch_resource(&self.resource_guid)
    }
}

/// Builds desired-state item sets from selected stacks and notebooks.
pub struct RemoteItemBuilder {
    store: Arc<dyn NoteStore>,
    notebooks: Vec<Notebook>,
}

impl RemoteItemBuilder {
    /// List the provider's notebooks once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the notebooks cannot be listed.
    pub fn load(store: Arc<dyn NoteStore>) -> Result<Self> {
        info!("Loading notebook list");
        let notebooks = store
            .list_notebooks()
            .map_err(|e| Error::remote(format!("Could not load notebooks: {}", e)))?;
        info!(count = notebooks.len(), "Loaded notebooks");
        if notebooks.is_empty() {
            warn!("Notebook list is empty. No notebooks found");
        }
        Ok(Self { store, notebooks })
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    /// Items of every notebook in each named stack, stacks in the given order.
    pub fn items_for_stacks<S: AsRef<str>>(&self, stacks: &[S]) -> Result<ItemSet> {
        stacks.iter().try_fold(ItemSet::new(), |items, stack| {
            Ok(items.merge(self.items_for_stack(stack.as_ref())?))
        })
    }

    /// Items of every notebook named in `names`, in the given order.
    pub fn items_for_notebooks<S: AsRef<str>>(&self, names: &[S]) -> Result<ItemSet> {
        names.iter().try_fold(ItemSet::new(), |items, name| {
            Ok(items.merge(self.items_for_notebook_named(name.as_ref())?))
        })
    }

    pub fn items_for_stack(&self, stack: &str) -> Result<ItemSet> {
        let selected: Vec<&Notebook> = self
            .notebooks
            .iter()
            .filter(|n| n.stack.as_deref() == Some(stack))
            .collect();
        if selected.is_empty() {
            warn!(stack, "No notebooks found in stack");
        }

        selected.into_iter().try_fold(ItemSet::new(), |items, notebook| {
            info!(notebook = %notebook.name, stack, "Found notebook in stack");
            Ok(items.merge(self.items_for_notebook(notebook)?))
        })
    }

    pub fn items_for_notebook_named(&self, name: &str) -> Result<ItemSet> {
        let selected: Vec<&Notebook> = self.notebooks.iter().filter(|n| n.name == name).collect();
        if selected.is_empty() {
            warn!(notebook = name, "No notebook found with that name");
        }

        selected.into_iter().try_fold(ItemSet::new(), |items, notebook| {
            Ok(items.merge(self.items_for_notebook(notebook)?))
        })
    }

    /// Items for every attachment in `notebook`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if a page of notes cannot be loaded.
    pub fn items_for_notebook(&self, notebook: &Notebook) -> Result<ItemSet> {
        let base = notebook_path(notebook);
        let mut items = ItemSet::new();
        let mut notes = 0usize;

        for note in NotePages::new(self.store.as_ref(), &notebook.guid) {
            let note = note.map_err(|e| {
                Error::remote(format!(
                    "Could not load notes for notebook '{}' with guid {}: {}",
                    notebook.name, notebook.guid, e
                ))
            })?;
            notes += 1;
            items = items.merge(self.items_for_note(&note, &base));
        }

        if notes == 0 {
            debug!(notebook = %notebook.name, "Notebook is empty");
        } else {
            debug!(notebook = %notebook.name, notes, attachments = items.len(), "Processed notes");
        }
        Ok(items)
    }

    fn items_for_note(&self, note: &Note, base: &IdentityPath) -> ItemSet {
        if note.resources.is_empty() {
            info!(title = %note.title, guid = %note.guid, "Note has no attachments; skipping");
            return ItemSet::new();
        }

        let title = replace_slash(&note.title);
        let single = note.resources.len() == 1;
        if single {
            debug!(title = %note.title, "Note has one attachment; using note title as file name");
        } else {
            debug!(title = %note.title, count = note.resources.len(), "Note has several attachments");
        }

        note.resources
            .iter()
            .map(|resource| {
                let path = if single {
                    base.append(format!("{}{}", title, file_suffix(resource.file_name.as_deref())))
                } else {
                    let file_name = resource.file_name.as_deref().unwrap_or(&resource.guid);
                    base.append(&title).append(replace_slash(file_name))
                };
                Item::new(
                    path,
                    resource.body_hash.clone(),
                    note.updated,
                    Arc::new(RemoteContent::new(Arc::clone(&self.store), &resource.guid)),
                )
            })
            .collect()
    }
}

fn notebook_path(notebook: &Notebook) -> IdentityPath {
    let stack = notebook.stack.as_deref().map(replace_slash).unwrap_or_default();
    IdentityPath::empty()
        .append(stack)
        .append(replace_slash(&notebook.name))
}

/// Make a provider name usable as a single path segment.
pub fn replace_slash(name: &str) -> String {
    name.replace('/', "_")
}

/// The extension of `file_name` including its dot, or `""`.
///
/// A dot in first position (hidden files) does not start an extension.
pub fn file_suffix(file_name: Option<&str>) -> &str {
    file_name
        .and_then(|name| name.rfind('.').filter(|&idx| idx > 0).map(|idx| &name[idx..]))
        .unwrap_or("")
}
