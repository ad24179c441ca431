//! Preview strategy: report only

use notesync_fs::IdentityPath;

use crate::events::{EntryKind, EventSink, SyncEvent};

pub(super) fn write(location: &IdentityPath, sink: &dyn EventSink) {
    sink.emit(SyncEvent::WouldWrite {
        location: location.to_string(),
    });
}

pub(super) fn delete(location: &IdentityPath, kind: EntryKind, sink: &dyn EventSink) {
    sink.emit(SyncEvent::WouldDelete {
        location: location.to_string(),
        kind,
    });
}
