//! Shared test utilities for the notesync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`] temporary directory with setup and assertion helpers
//! - [`snapshot`]: [`SnapshotBuilder`] writing provider snapshots and their data files

pub mod snapshot;
pub mod tree;

pub use snapshot::SnapshotBuilder;
pub use tree::TestTree;
