//! Items: the unit both sides of a reconciliation are made of

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notesync_fs::IdentityPath;

use crate::Result;

/// Deferred access to an item's bytes.
///
/// Providers hand out a content source instead of the bytes themselves, so
/// building and diffing item sets never downloads or reads content. `read` is
/// called at most once per executed operation.
pub trait ContentSource: Send + Sync {
    /// Produce the full content.
    fn read(&self) -> Result<Vec<u8>>;
}

/// Content held in memory.
#[derive(Debug, Clone, Default)]
pub struct BytesContent(Arc<[u8]>);

impl BytesContent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self(Arc::from(bytes))
    }
}

impl ContentSource for BytesContent {
    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.0.to_vec())
    }
}

/// Content of an entry that has none, such as a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContent;

impl ContentSource for EmptyContent {
    fn read(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// A single addressable entry of the current or the desired state.
///
/// Items are immutable; cloning one shares its content source.
#[derive(Clone)]
pub struct Item {
    path: IdentityPath,
    fingerprint: String,
    modified_at: DateTime<Utc>,
    content: Arc<dyn ContentSource>,
}

impl Item {
    pub fn new(
        path: IdentityPath,
        fingerprint: impl Into<String>,
        modified_at: DateTime<Utc>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            path,
            fingerprint: fingerprint.into(),
            modified_at,
            content,
        }
    }

    pub fn path(&self) -> &IdentityPath {
        &self.path
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Force the content source. Never called while diffing.
    pub fn read_content(&self) -> Result<Vec<u8>> {
        self.content.read()
    }

    /// True if both items have the same identity path.
    pub fn matches_path(&self, other: &Item) -> bool {
        self.path == other.path
    }

    /// True if both items have the same fingerprint.
    pub fn matches_fingerprint(&self, other: &Item) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("path", &self.path)
            .field("fingerprint", &self.fingerprint)
            .field("modified_at", &self.modified_at)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (MD5:{})", self.path, self.fingerprint)
    }
}
