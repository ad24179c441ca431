//! Apply strategy: real writes and deletes

use notesync_fs::{IdentityPath, io};

use crate::Result;
use crate::events::{EntryKind, EventSink, SyncEvent};
use crate::item::Item;

pub(super) fn write(item: &Item, location: &IdentityPath, sink: &dyn EventSink) {
    match write_item(item, location) {
        Ok(()) => sink.emit(SyncEvent::Written {
            location: location.to_string(),
        }),
        Err(e) => sink.emit(SyncEvent::WriteFailed {
            location: location.to_string(),
            error: e.to_string(),
        }),
    }
}

pub(super) fn delete(location: &IdentityPath, kind: EntryKind, sink: &dyn EventSink) {
    let removed = match kind {
        EntryKind::File => io::remove_file(location),
        EntryKind::Directory => io::remove_empty_dir(location),
    };

    match removed {
        Ok(()) => sink.emit(SyncEvent::Deleted {
            location: location.to_string(),
            kind,
        }),
        Err(e) => sink.emit(SyncEvent::DeleteFailed {
            location: location.to_string(),
            kind,
            error: e.to_string(),
        }),
    }
}

fn write_item(item: &Item, location: &IdentityPath) -> Result<()> {
    let content = item.read_content()?;
    io::write_atomic(location, &content)?;
    io::set_modified(location, item.modified_at())?;
    Ok(())
}
