//! Tests for building desired state from a note store

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use notesync_core::{
    Error, ItemSet, MemoryNoteStore, NotePages, NoteStore, Notebook, NotesPage, RemoteItemBuilder,
    Result,
};
use notesync_fs::fingerprint_bytes;
use notesync_test_utils::SnapshotBuilder;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn updated() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn paths(store: MemoryNoteStore, select: impl Fn(&RemoteItemBuilder) -> Result<ItemSet>) -> Vec<String> {
    let builder = RemoteItemBuilder::load(Arc::new(store)).unwrap();
    select(&builder)
        .unwrap()
        .iter()
        .map(|i| i.path().to_string())
        .collect()
}

/// Wraps a store and counts page requests.
struct PageCounter {
    inner: MemoryNoteStore,
    pages: AtomicUsize,
    fail_from_page: Option<usize>,
    report_total: Option<usize>,
}

impl PageCounter {
    fn new(inner: MemoryNoteStore) -> Self {
        Self {
            inner,
            pages: AtomicUsize::new(0),
            fail_from_page: None,
            report_total: None,
        }
    }
}

impl NoteStore for PageCounter {
    fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        self.inner.list_notebooks()
    }

    fn find_notes(&self, notebook_guid: &str, offset: usize, max: usize) -> Result<NotesPage> {
        let page = self.pages.fetch_add(1, Ordering::SeqCst);
        if self.fail_from_page.is_some_and(|n| page >= n) {
            return Err(Error::remote("rate limited"));
        }
        let mut page = self.inner.find_notes(notebook_guid, offset, max)?;
        if let Some(total) = self.report_total {
            page.total = total;
        }
        Ok(page)
    }

    fn fetch_resource(&self, resource_guid: &str) -> Result<Vec<u8>> {
        self.inner.fetch_resource(resource_guid)
    }
}

struct Offline;

impl NoteStore for Offline {
    fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        Err(Error::remote("authentication failed"))
    }

    fn find_notes(&self, _: &str, _: usize, _: usize) -> Result<NotesPage> {
        Err(Error::remote("authentication failed"))
    }

    fn fetch_resource(&self, _: &str) -> Result<Vec<u8>> {
        Err(Error::remote("authentication failed"))
    }
}

fn notebook_with_notes(count: usize) -> (MemoryNoteStore, String) {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("Bulk", None);
    for i in 0..count {
        let note = store.add_note(&notebook, &format!("n{:03}", i), updated()).unwrap();
        store.add_resource(&note, Some("f.txt"), format!("{}", i)).unwrap();
    }
    (store, notebook)
}

#[test]
fn test_single_attachment_uses_title_and_suffix() {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("Receipts", Some("Finance"));
    let note = store.add_note(&notebook, "Lunch", updated()).unwrap();
    store.add_resource(&note, Some("scan.final.pdf"), "pdf").unwrap();

    let builder = RemoteItemBuilder::load(Arc::new(store)).unwrap();
    let items = builder.items_for_stacks(&["Finance"]).unwrap();
    let item = items.iter().next().unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(item.path().as_str(), "Finance/Receipts/Lunch.pdf");
    assert_eq!(item.fingerprint(), fingerprint_bytes(b"pdf"));
    assert_eq!(item.modified_at(), updated());
}

#[rstest]
#[case::no_extension(Some("README"), "Note")]
#[case::hidden_file(Some(".profile"), "Note")]
#[case::no_file_name(None, "Note")]
#[case::extension(Some("a.b.png"), "Note.png")]
fn test_single_attachment_suffix(#[case] file_name: Option<&str>, #[case] expected: &str) {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("Inbox", None);
    let note = store.add_note(&notebook, "Note", updated()).unwrap();
    store.add_resource(&note, file_name, "x").unwrap();

    let paths = paths(store, |b| b.items_for_notebooks(&["Inbox"]));
    assert_eq!(paths, vec![format!("Inbox/{}", expected)]);
}

#[test]
fn test_several_attachments_get_a_title_directory() {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("Travel", Some("Personal"));
    let note = store.add_note(&notebook, "Trip", updated()).unwrap();
    store.add_resource(&note, Some("a.jpg"), "a").unwrap();
    store.add_resource(&note, Some("b/c.jpg"), "b").unwrap();
    let unnamed = store.add_resource(&note, None, "c").unwrap();

    let paths = paths(store, |b| b.items_for_stacks(&["Personal"]));
    assert_eq!(
        paths,
        vec![
            "Personal/Travel/Trip/a.jpg".to_string(),
            "Personal/Travel/Trip/b_c.jpg".to_string(),
            format!("Personal/Travel/Trip/{}", unnamed),
        ]
    );
}

#[test]
fn test_slashes_in_names_are_replaced() {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("2023/24", Some("Tax/Returns"));
    let note = store.add_note(&notebook, "Q1/Q2", updated()).unwrap();
    store.add_resource(&note, Some("x.pdf"), "x").unwrap();

    let paths = paths(store, |b| b.items_for_stacks(&["Tax/Returns"]));
    assert_eq!(paths, vec!["Tax_Returns/2023_24/Q1_Q2.pdf"]);
}

#[test]
fn test_notes_without_attachments_are_skipped() {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("Inbox", None);
    store.add_note(&notebook, "Text only", updated()).unwrap();

    let paths = paths(store, |b| b.items_for_notebooks(&["Inbox"]));
    assert!(paths.is_empty());
}

#[test]
fn test_selection_order_is_preserved() {
    let mut store = MemoryNoteStore::new();
    for stack in ["A", "B"] {
        let notebook = store.add_notebook("Book", Some(stack));
        let note = store.add_note(&notebook, stack, updated()).unwrap();
        store.add_resource(&note, Some("f.txt"), stack).unwrap();
    }

    let paths = paths(store, |b| b.items_for_stacks(&["B", "A"]));
    assert_eq!(paths, vec!["B/Book/B.txt", "A/Book/A.txt"]);
}

#[test]
fn test_unknown_names_select_nothing() {
    let (store, _) = notebook_with_notes(1);
    let builder = RemoteItemBuilder::load(Arc::new(store)).unwrap();

    assert!(builder.items_for_stacks(&["Nope"]).unwrap().is_empty());
    assert!(builder.items_for_notebooks(&["Nope"]).unwrap().is_empty());
}

#[rstest]
#[case::empty(0, 1)]
#[case::short_page(42, 1)]
#[case::exact_pages(200, 3)]
#[case::partial_last_page(250, 3)]
fn test_notes_are_paged(#[case] notes: usize, #[case] requests: usize) {
    let (store, _) = notebook_with_notes(notes);
    let counter = Arc::new(PageCounter::new(store));
    let builder = RemoteItemBuilder::load(counter.clone()).unwrap();

    let items = builder.items_for_notebooks(&["Bulk"]).unwrap();

    assert_eq!(items.len(), notes);
    assert_eq!(counter.pages.load(Ordering::SeqCst), requests);
}

#[test]
fn test_unreported_total_does_not_end_paging() {
    // A store that leaves `total` at zero still pages until a short page
    let (store, _) = notebook_with_notes(150);
    let mut counter = PageCounter::new(store);
    counter.report_total = Some(0);
    let counter = Arc::new(counter);
    let builder = RemoteItemBuilder::load(counter.clone()).unwrap();

    let items = builder.items_for_notebook_named("Bulk").unwrap();

    assert_eq!(items.len(), 150);
    assert_eq!(counter.pages.load(Ordering::SeqCst), 2);
}

#[test]
fn test_page_iterator_stops_after_first_error() {
    let (store, notebook) = notebook_with_notes(150);
    let mut counter = PageCounter::new(store);
    counter.fail_from_page = Some(1);

    let results: Vec<_> = NotePages::new(&counter, &notebook).collect();

    assert_eq!(results.len(), 101);
    assert!(results[..100].iter().all(|r| r.is_ok()));
    assert!(results[100].is_err());
}

#[test]
fn test_page_failure_fails_the_notebook() {
    let (store, _) = notebook_with_notes(150);
    let mut counter = PageCounter::new(store);
    counter.fail_from_page = Some(1);
    let builder = RemoteItemBuilder::load(Arc::new(counter)).unwrap();

    let err = builder.items_for_notebooks(&["Bulk"]).unwrap_err();
    assert!(matches!(err, Error::Remote { .. }));
    assert!(err.to_string().contains("Bulk"));
}

#[test]
fn test_unreachable_store_is_fatal() {
    let err = RemoteItemBuilder::load(Arc::new(Offline)).err().unwrap();
    assert!(err.to_string().contains("authentication failed"));
}

#[test]
fn test_attachments_are_fetched_on_demand() {
    let mut store = MemoryNoteStore::new();
    let notebook = store.add_notebook("Inbox", None);
    let note = store.add_note(&notebook, "Note", updated()).unwrap();
    store.add_resource(&note, Some("a.txt"), "payload").unwrap();
    let store = Arc::new(store);

    let builder = RemoteItemBuilder::load(store.clone()).unwrap();
    let items = builder.items_for_notebooks(&["Inbox"]).unwrap();
    assert_eq!(store.fetch_count(), 0);

    let content = items.iter().next().unwrap().read_content().unwrap();
    assert_eq!(content, b"payload");
    assert_eq!(store.fetch_count(), 1);
}

#[test]
fn test_snapshot_round_trips_into_items() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = SnapshotBuilder::new()
        .notebook("Receipts", Some("Finance"))
        .note("Lunch", "2024-03-01T12:00:00Z")
        .resource(Some("lunch.pdf"), "pdf bytes")
        .note("Trip", "2024-03-02T08:00:00Z")
        .resource(Some("a.jpg"), "a")
        .resource(Some("b.jpg"), "b")
        .write(dir.path());

    let store = MemoryNoteStore::load_snapshot(&snapshot).unwrap();
    let builder = RemoteItemBuilder::load(Arc::new(store)).unwrap();
    let items = builder.items_for_stacks(&["Finance"]).unwrap();

    let found: Vec<(String, String)> = items
        .iter()
        .map(|i| (i.path().to_string(), i.fingerprint().to_string()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("Finance/Receipts/Lunch.pdf".to_string(), fingerprint_bytes(b"pdf bytes")),
            ("Finance/Receipts/Trip/a.jpg".to_string(), fingerprint_bytes(b"a")),
            ("Finance/Receipts/Trip/b.jpg".to_string(), fingerprint_bytes(b"b")),
        ]
    );
    assert_eq!(items.iter().next().unwrap().read_content().unwrap(), b"pdf bytes");
}

#[test]
fn test_snapshot_title_with_newline_loads() {
    // Titles are free text; quotes and line breaks must survive the snapshot file
    let dir = tempfile::tempdir().unwrap();
    let snapshot = SnapshotBuilder::new()
        .notebook("Inbox", None)
        .note("line1\nline2", "2024-03-01T12:00:00Z")
        .resource(Some("a.txt"), "a")
        .note("Say \"hi\"", "2024-03-01T12:00:00Z")
        .resource(Some("b.txt"), "b")
        .write(dir.path());

    let store = MemoryNoteStore::load_snapshot(&snapshot).unwrap();
    let found = paths(store, |b| b.items_for_notebooks(&["Inbox"]));

    assert_eq!(found, vec!["Inbox/line1\nline2.txt", "Inbox/Say \"hi\".txt"]);
}

#[test]
fn test_snapshot_with_missing_data_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.toml");
    std::fs::write(
        &snapshot,
        r#"
[[notebooks]]
name = "Inbox"

[[notebooks.notes]]
title = "Gone"
updated = "2024-03-01T12:00:00Z"

[[notebooks.notes.resources]]
path = "data/missing.bin"
"#,
    )
    .unwrap();

    let err = MemoryNoteStore::load_snapshot(&snapshot).unwrap_err();
    assert!(matches!(err, Error::Snapshot { .. }));
}

#[test]
fn test_snapshot_hash_is_trusted_when_present() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/a.bin"), "a").unwrap();
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(
        &snapshot,
        r#"{"notebooks":[{"name":"Inbox","notes":[{"title":"A","updated":"2024-03-01T12:00:00Z",
            "resources":[{"file_name":"a.txt","path":"data/a.bin","hash":"0123456789abcdef0123456789abcdef"}]}]}]}"#,
    )
    .unwrap();

    let store = MemoryNoteStore::load_snapshot(&snapshot).unwrap();
    let builder = RemoteItemBuilder::load(Arc::new(store)).unwrap();
    let items = builder.items_for_notebooks(&["Inbox"]).unwrap();

    assert_eq!(
        items.iter().next().unwrap().fingerprint(),
        "0123456789abcdef0123456789abcdef"
    );
}
