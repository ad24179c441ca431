//! Reconciliation engine for notesync
//!
//! This crate compares two item sets and produces the operations that make
//! the current one look like the desired one:
//!
//! - **Items**: path, fingerprint, timestamp and deferred content
//! - **Diff**: [`ItemSet::diff`] plans creates, updates and no-ops in desired
//!   order, then deletes in current order
//! - **Factory**: [`OperationFactory`] builds operations for the Apply or the
//!   Preview strategy and reports through an [`EventSink`]
//! - **Providers**: [`scan_directory`] for the local tree and
//!   [`RemoteItemBuilder`] for a note store
//!
//! # Architecture
//!
//! ```text
//!                 notesync-cli
//!                      |
//!                notesync-core
//!        +------+------+-------+--------+
//!        |      |      |       |        |
//!     local  remote  item_set factory  events
//!                      |
//!                 notesync-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notesync_core::{FactoryOptions, OperationFactory, TracingSink, scan_directory};
//!
//! let current = scan_directory(root);
//! let factory = OperationFactory::preview(FactoryOptions::new(root_str), Arc::new(TracingSink));
//! let summary = current.diff(&desired, &factory).execute();
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod item;
pub mod item_set;
pub mod local;
pub mod operation;
pub mod remote;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use events::{EntryKind, EventSink, RecordingSink, SyncEvent, TracingSink};
pub use factory::{FactoryOptions, OperationFactory, Strategy};
pub use item::{BytesContent, ContentSource, EmptyContent, Item};
pub use item_set::ItemSet;
pub use local::{FileContent, scan_directory};
pub use operation::{Operation, OperationKind, Plan, PlanSummary};
pub use remote::{
    MemoryNoteStore, Note, NotePages, NoteStore, Notebook, NotesPage, PAGE_SIZE, RemoteContent,
    RemoteItemBuilder, Resource, Snapshot,
};
