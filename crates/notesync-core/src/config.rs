//! Run configuration
//!
//! A [`SyncConfig`] can be loaded from a TOML, JSON or YAML file and merged
//! with command-line values. It is validated once, before any state is read.

use std::path::{Path, PathBuf};

use notesync_fs::{ConfigStore, IdentityPath};
use serde::Deserialize;

use crate::factory::{FactoryOptions, Strategy};
use crate::{Error, Result};

/// Settings for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local root; the current directory when unset
    pub directory: Option<PathBuf>,
    /// Provider snapshot supplying the desired state
    pub snapshot: Option<PathBuf>,
    pub stacks: Vec<String>,
    pub notebooks: Vec<String>,
    /// Allow deletes to remove local entries
    pub delete: bool,
    /// Regular expressions protecting entries from deletion
    pub delete_excludes: Vec<String>,
    /// `apply` or `preview`; Apply when unset
    pub strategy: Option<Strategy>,
    /// Shorthand for `strategy = "preview"`, and wins over it
    pub dry_run: bool,
}

impl SyncConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load(&IdentityPath::new(path))?)
    }

    /// Overlay `other` onto `self`.
    ///
    /// Scalars set in `other` win, switches are OR-ed, and lists are extended
    /// with the values `self` does not already hold.
    pub fn merge(&mut self, other: SyncConfig) {
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        if other.snapshot.is_some() {
            self.snapshot = other.snapshot;
        }
        if other.strategy.is_some() {
            self.strategy = other.strategy;
        }
        self.delete |= other.delete;
        self.dry_run |= other.dry_run;

        extend_unique(&mut self.stacks, other.stacks);
        extend_unique(&mut self.notebooks, other.notebooks);
        extend_unique(&mut self.delete_excludes, other.delete_excludes);
    }

    /// Check that the run has something to synchronize.
    pub fn validate(&self) -> Result<()> {
        if self.stacks.is_empty() && self.notebooks.is_empty() {
            return Err(Error::InvalidConfig {
                message: "at least one stack or notebook is required".into(),
            });
        }
        if self.snapshot.is_none() {
            return Err(Error::InvalidConfig {
                message: "a snapshot file is required".into(),
            });
        }
        Ok(())
    }

    pub fn strategy(&self) -> Strategy {
        if self.dry_run {
            Strategy::Preview
        } else {
            self.strategy.unwrap_or_default()
        }
    }

    /// Factory options rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails if an exclusion pattern is not a valid regular expression.
    pub fn factory_options(&self, root: impl Into<String>) -> Result<FactoryOptions> {
        let patterns = FactoryOptions::compile_patterns(self.delete_excludes.as_slice())?;
        Ok(FactoryOptions::new(root)
            .with_delete(self.delete)
            .with_exclude_patterns(patterns))
    }
}

fn extend_unique(target: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}
