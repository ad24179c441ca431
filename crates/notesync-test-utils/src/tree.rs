//! [`TestTree`]: a temporary local root for reconciliation tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory with helpers for building and checking a local tree.
///
/// # Example
///
/// ```rust,no_run
/// use notesync_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write_file("Finance/Receipts/Lunch.pdf", "x");
/// tree.assert_file_contains("Finance/Receipts/Lunch.pdf", "x");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root as a string, suitable for a factory root.
    pub fn root_str(&self) -> String {
        self.root().to_string_lossy().into_owned()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("write_file: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", path.display()));
        path
    }

    /// Create the directory `relative` and its parents.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("mkdir: failed to create {}: {e}", path.display()));
        path
    }

    pub fn read(&self, relative: &str) -> Vec<u8> {
        let path = self.path(relative);
        fs::read(&path).unwrap_or_else(|e| panic!("read: failed to read {}: {e}", path.display()))
    }

    /// Every file and directory below the root, relative, `/`-separated, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut entries = Vec::new();
        collect(self.root(), self.root(), &mut entries);
        entries.sort();
        entries
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected path to exist: {}", path.display());
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(!path.exists(), "Expected path NOT to exist: {}", path.display());
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        let actual = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        assert!(
            actual.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            path.display(),
            content,
            actual
        );
    }
}

fn collect(root: &Path, dir: &Path, entries: &mut Vec<String>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        if let Ok(relative) = path.strip_prefix(root) {
            entries.push(relative.to_string_lossy().replace('\\', "/"));
        }
        if path.is_dir() {
            collect(root, &path, entries);
        }
    }
}
