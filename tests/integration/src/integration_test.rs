//! End-to-end reconciliation: snapshot -> desired state -> plan -> local tree
//!
//! Each test drives the library the way the CLI does, across several runs,
//! and checks the local tree after every run.

use std::path::Path;
use std::sync::Arc;

use notesync_core::{
    FactoryOptions, ItemSet, MemoryNoteStore, OperationFactory, PlanSummary, RecordingSink,
    RemoteItemBuilder, Strategy, SyncEvent, scan_directory,
};
use notesync_test_utils::{SnapshotBuilder, TestTree};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn desired_from(snapshot: &Path, stacks: &[&str], notebooks: &[&str]) -> ItemSet {
    let store = MemoryNoteStore::load_snapshot(snapshot).unwrap();
    let builder = RemoteItemBuilder::load(Arc::new(store)).unwrap();
    builder
        .items_for_stacks(stacks)
        .unwrap()
        .merge(builder.items_for_notebooks(notebooks).unwrap())
}

fn sync(
    tree: &TestTree,
    desired: &ItemSet,
    strategy: Strategy,
    options: FactoryOptions,
) -> (PlanSummary, Vec<SyncEvent>) {
    let sink = Arc::new(RecordingSink::new());
    let factory = OperationFactory::new(strategy, options, sink.clone());
    let summary = scan_directory(tree.root()).diff(desired, &factory).execute();
    (summary, sink.events())
}

#[test]
fn test_repeated_runs_converge() {
    let tree = TestTree::new();
    let source = TempDir::new().unwrap();
    let snapshot = SnapshotBuilder::new()
        .notebook("Receipts", Some("Finance"))
        .note("Lunch", "2024-03-01T12:00:00Z")
        .resource(Some("lunch.pdf"), "v1")
        .write(source.path());
    let options = FactoryOptions::new(tree.root_str()).with_delete(true);

    // First run creates
    let desired = desired_from(&snapshot, &["Finance"], &[]);
    let (summary, _) = sync(&tree, &desired, Strategy::Apply, options.clone());
    assert_eq!(summary.create, 1);
    tree.assert_file_contains("Finance/Receipts/Lunch.pdf", "v1");

    // Second run has nothing to write; the parent directories are not empty
    let (summary, events) = sync(&tree, &desired, Strategy::Apply, options.clone());
    assert_eq!(summary.no_op, 1);
    assert_eq!(summary.create + summary.update, 0);
    assert!(events.iter().all(|e| !e.is_mutation()));

    // Changed content is updated in place
    let snapshot = SnapshotBuilder::new()
        .notebook("Receipts", Some("Finance"))
        .note("Lunch", "2024-03-05T12:00:00Z")
        .resource(Some("lunch.pdf"), "v2 is longer")
        .write(source.path());
    let desired = desired_from(&snapshot, &["Finance"], &[]);
    let (summary, _) = sync(&tree, &desired, Strategy::Apply, options);
    assert_eq!(summary.update, 1);
    assert_eq!(tree.read("Finance/Receipts/Lunch.pdf"), b"v2 is longer");
}

#[test]
fn test_removed_note_is_deleted_with_its_directory_on_the_next_run() {
    let tree = TestTree::new();
    let source = TempDir::new().unwrap();
    let options = FactoryOptions::new(tree.root_str()).with_delete(true);

    let before = SnapshotBuilder::new()
        .notebook("Inbox", None)
        .note("Keep", "2024-03-01T12:00:00Z")
        .resource(Some("keep.txt"), "keep")
        .note("Photos", "2024-03-01T12:00:00Z")
        .resource(Some("a.jpg"), "a")
        .resource(Some("b.jpg"), "b")
        .write(source.path());
    sync(
        &tree,
        &desired_from(&before, &[], &["Inbox"]),
        Strategy::Apply,
        options.clone(),
    );
    tree.assert_exists("Inbox/Photos/a.jpg");

    let after = SnapshotBuilder::new()
        .notebook("Inbox", None)
        .note("Keep", "2024-03-01T12:00:00Z")
        .resource(Some("keep.txt"), "keep")
        .write(source.path());
    let desired = desired_from(&after, &[], &["Inbox"]);

    // The directory sorts before its files, so it is still full when visited
    sync(&tree, &desired, Strategy::Apply, options.clone());
    tree.assert_not_exists("Inbox/Photos/a.jpg");
    tree.assert_not_exists("Inbox/Photos/b.jpg");
    tree.assert_exists("Inbox/Photos");

    // Now empty, it goes on the next run
    sync(&tree, &desired, Strategy::Apply, options);
    tree.assert_not_exists("Inbox/Photos");
    assert_eq!(tree.entries(), vec!["Inbox", "Inbox/Keep.txt"]);
}

#[test]
fn test_preview_reports_the_apply_plan_without_touching_the_tree() {
    let tree = TestTree::new();
    tree.write_file("stale/old.txt", "old");
    let source = TempDir::new().unwrap();
    let snapshot = SnapshotBuilder::new()
        .notebook("Inbox", None)
        .note("New", "2024-03-01T12:00:00Z")
        .resource(Some("new.md"), "# new")
        .write(source.path());
    let desired = desired_from(&snapshot, &[], &["Inbox"]);
    let options = FactoryOptions::new(tree.root_str()).with_delete(true);

    let (preview, events) = sync(&tree, &desired, Strategy::Preview, options.clone());
    assert_eq!(tree.entries(), vec!["stale", "stale/old.txt"]);
    assert_eq!(events.len(), preview.total());

    let (applied, _) = sync(&tree, &desired, Strategy::Apply, options);
    assert_eq!(preview, applied);
    tree.assert_exists("Inbox/New.md");
    tree.assert_not_exists("stale/old.txt");
}

#[test]
fn test_excluded_local_files_survive_deletion() {
    let tree = TestTree::new();
    tree.write_file("Inbox/local-notes.md", "mine");
    tree.write_file("Inbox/obsolete.txt", "gone");
    let source = TempDir::new().unwrap();
    let snapshot = SnapshotBuilder::new()
        .notebook("Inbox", None)
        .note("Remote", "2024-03-01T12:00:00Z")
        .resource(Some("r.txt"), "remote")
        .write(source.path());
    let patterns = FactoryOptions::compile_patterns(&[r"Inbox/local-.*"]).unwrap();
    let options = FactoryOptions::new(tree.root_str())
        .with_delete(true)
        .with_exclude_patterns(patterns);

    let (_, events) = sync(
        &tree,
        &desired_from(&snapshot, &[], &["Inbox"]),
        Strategy::Apply,
        options,
    );

    tree.assert_exists("Inbox/local-notes.md");
    tree.assert_not_exists("Inbox/obsolete.txt");
    tree.assert_file_contains("Inbox/Remote.txt", "remote");
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SyncEvent::Excluded { pattern, .. } if pattern == "Inbox/local-.*"))
    );
}
