//! Operation factory: turns diff decisions into deferred operations
//!
//! One factory is built at startup with a [`Strategy`]:
//!
//! - **Apply**: writes and deletes under the root
//! - **Preview**: reports what Apply would do and never touches storage
//!
//! Both strategies share every decision (location resolution, the delete
//! switch, the file / empty directory check, exclusion patterns). Only the
//! final step differs.

mod apply;
mod preview;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use notesync_fs::{IdentityPath, PathPattern};
use serde::Deserialize;

use crate::events::{EntryKind, EventSink, SyncEvent};
use crate::item::Item;
use crate::operation::{Operation, OperationKind};
use crate::{Error, Result};

/// How planned operations take effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Apply,
    Preview,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => write!(f, "apply"),
            Self::Preview => write!(f, "preview"),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "apply" => Ok(Self::Apply),
            "preview" | "dry-run" | "dry_run" => Ok(Self::Preview),
            other => Err(Error::InvalidConfig {
                message: format!("unknown strategy '{}'", other),
            }),
        }
    }
}

/// Where operations act and what deletes are allowed to remove.
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Location every identity path is resolved against
    pub root: String,
    /// Deletes only mutate storage when this is set
    pub delete_enabled: bool,
    /// Checked in order; the first full match suppresses a delete
    pub exclude_patterns: Vec<PathPattern>,
}

impl FactoryOptions {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            delete_enabled: false,
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_delete(mut self, enabled: bool) -> Self {
        self.delete_enabled = enabled;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<PathPattern>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Compile raw exclusion patterns, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails on the first pattern that is not a valid regular expression.
    pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathPattern>> {
        patterns
            .iter()
            .map(|p| PathPattern::new(p.as_ref()).map_err(Error::from))
            .collect()
    }
}

/// Builds operations for one strategy.
///
/// Cloning is cheap; clones share options and event sink.
#[derive(Clone)]
pub struct OperationFactory {
    inner: Arc<Inner>,
}

struct Inner {
    strategy: Strategy,
    options: FactoryOptions,
    sink: Arc<dyn EventSink>,
}

impl OperationFactory {
    pub fn new(strategy: Strategy, options: FactoryOptions, sink: Arc<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                strategy,
                options,
                sink,
            }),
        }
    }

    pub fn apply(options: FactoryOptions, sink: Arc<dyn EventSink>) -> Self {
        Self::new(Strategy::Apply, options, sink)
    }

    pub fn preview(options: FactoryOptions, sink: Arc<dyn EventSink>) -> Self {
        Self::new(Strategy::Preview, options, sink)
    }

    pub fn strategy(&self) -> Strategy {
        self.inner.strategy
    }

    pub fn options(&self) -> &FactoryOptions {
        &self.inner.options
    }

    /// Location `item` resolves to under the root.
    pub fn location_of(&self, item: &Item) -> IdentityPath {
        self.inner.location_of(item)
    }

    /// The item is already up to date; only reported.
    pub fn no_op(&self, item: &Item) -> Operation {
        let inner = Arc::clone(&self.inner);
        let target = item.clone();
        Operation::new(OperationKind::NoOp, item.path().clone(), move || {
            let location = inner.location_of(&target);
            inner.sink.emit(SyncEvent::Unchanged {
                location: location.to_string(),
            });
        })
    }

    /// Replace `existing` with the content and timestamp of `replacement`.
    pub fn update(&self, existing: &Item, replacement: &Item) -> Operation {
        debug_assert!(existing.matches_path(replacement));
        self.write(OperationKind::Update, replacement)
    }

    /// Write an item that has no current counterpart.
    pub fn create(&self, item: &Item) -> Operation {
        self.write(OperationKind::Create, item)
    }

    /// Remove the entry of a current item that the desired state lacks.
    pub fn delete(&self, item: &Item) -> Operation {
        let inner = Arc::clone(&self.inner);
        let target = item.clone();
        Operation::new(OperationKind::Delete, item.path().clone(), move || {
            inner.delete(&target);
        })
    }

    fn write(&self, kind: OperationKind, item: &Item) -> Operation {
        let inner = Arc::clone(&self.inner);
        let source = item.clone();
        Operation::new(kind, item.path().clone(), move || {
            let location = inner.location_of(&source);
            match inner.strategy {
                Strategy::Apply => apply::write(&source, &location, inner.sink.as_ref()),
                Strategy::Preview => preview::write(&location, inner.sink.as_ref()),
            }
        })
    }
}

impl fmt::Debug for OperationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationFactory")
            .field("strategy", &self.inner.strategy)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn location_of(&self, item: &Item) -> IdentityPath {
        item.path().prepend(&self.options.root)
    }

    fn delete(&self, item: &Item) {
        let location = self.location_of(item);

        if !self.options.delete_enabled {
            self.sink.emit(SyncEvent::DeletionDisabled {
                location: location.to_string(),
            });
            return;
        }

        // Checked at execution time: earlier operations may have filled a directory
        let kind = if location.is_file() {
            EntryKind::File
        } else if location.is_empty_dir() {
            EntryKind::Directory
        } else {
            self.sink.emit(SyncEvent::NotDeletable {
                location: location.to_string(),
            });
            return;
        };

        let excluded_by = self
            .options
            .exclude_patterns
            .iter()
            .find(|pattern| item.path().matches(pattern) || location.matches(pattern));
        if let Some(pattern) = excluded_by {
            self.sink.emit(SyncEvent::Excluded {
                location: location.to_string(),
                kind,
                pattern: pattern.to_string(),
            });
            return;
        }

        match self.strategy {
            Strategy::Apply => apply::delete(&location, kind, self.sink.as_ref()),
            Strategy::Preview => preview::delete(&location, kind, self.sink.as_ref()),
        }
    }
}
