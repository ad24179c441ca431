//! Structured events emitted by executing operations
//!
//! Operations never log through a global; they report to the [`EventSink`]
//! their factory was built with. [`TracingSink`] forwards to `tracing`,
//! [`RecordingSink`] keeps events in memory.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// What kind of filesystem entry a delete concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "empty directory"),
        }
    }
}

/// One observable outcome of an executed operation.
///
/// `location` is always the resolved absolute location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    Unchanged {
        location: String,
    },
    Written {
        location: String,
    },
    WouldWrite {
        location: String,
    },
    WriteFailed {
        location: String,
        error: String,
    },
    Deleted {
        location: String,
        kind: EntryKind,
    },
    WouldDelete {
        location: String,
        kind: EntryKind,
    },
    DeleteFailed {
        location: String,
        kind: EntryKind,
        error: String,
    },
    DeletionDisabled {
        location: String,
    },
    Excluded {
        location: String,
        kind: EntryKind,
        pattern: String,
    },
    NotDeletable {
        location: String,
    },
}

impl SyncEvent {
    pub fn location(&self) -> &str {
        match self {
            Self::Unchanged { location }
            | Self::Written { location }
            | Self::WouldWrite { location }
            | Self::WriteFailed { location, .. }
            | Self::Deleted { location, .. }
            | Self::WouldDelete { location, .. }
            | Self::DeleteFailed { location, .. }
            | Self::DeletionDisabled { location }
            | Self::Excluded { location, .. }
            | Self::NotDeletable { location } => location,
        }
    }

    /// True for events that changed storage.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Written { .. } | Self::Deleted { .. })
    }

    /// True for events reporting a caught failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::WriteFailed { .. } | Self::DeleteFailed { .. })
    }
}

/// Receiver of operation events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Forwards events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SyncEvent) {
        match &event {
            SyncEvent::Unchanged { location } => {
                debug!(path = %location, "No operation for file");
            }
            SyncEvent::Written { location } => {
                info!(path = %location, "Created/updated file with new data");
            }
            SyncEvent::WouldWrite { location } => {
                info!(path = %location, "Dry run: won't create or update file");
            }
            SyncEvent::WriteFailed { location, error } => {
                error!(path = %location, %error, "Could not write file");
            }
            SyncEvent::Deleted { location, kind } => {
                info!(path = %location, %kind, "Deleted");
            }
            SyncEvent::WouldDelete { location, kind } => {
                info!(path = %location, %kind, "Dry run: won't delete");
            }
            SyncEvent::DeleteFailed {
                location,
                kind,
                error,
            } => {
                error!(path = %location, %kind, %error, "Could not delete");
            }
            SyncEvent::DeletionDisabled { location } => {
                info!(path = %location, "Deletion inactive. Use the delete option to remove it");
            }
            SyncEvent::Excluded {
                location,
                kind,
                pattern,
            } => {
                info!(path = %location, %kind, %pattern, "Matched exclude pattern. Won't delete");
            }
            SyncEvent::NotDeletable { location } => {
                debug!(path = %location, "Neither a file nor an empty directory. Won't delete");
            }
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the events recorded so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SyncEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
