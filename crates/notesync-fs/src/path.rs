//! Identity paths used to join local and remote entries
//!
//! An [`IdentityPath`] is the key both sides of a reconciliation agree on. It
//! is kept as a list of non-blank segments and compared by its normalized
//! string form, so the way a path was assembled never affects equality.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;

use crate::{Error, Result};

const SEPARATOR: char = '/';

/// A hierarchical name normalized to forward slashes.
///
/// Segments never contain a separator and are never blank. A path is absolute
/// only when it was parsed from (or prepended with) a root that starts with a
/// separator; appended segments never make a path absolute.
#[derive(Debug, Clone, Default)]
pub struct IdentityPath {
    absolute: bool,
    segments: Vec<String>,
    normalized: String,
}

impl IdentityPath {
    /// The path with no segments. Normalizes to `""`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a full path string, keeping a leading separator.
    ///
    /// Backslashes are treated as separators.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy().replace('\\', "/");
        let absolute = path.starts_with(SEPARATOR);
        Self::from_parts(absolute, split_segments(&path).collect())
    }

    /// Return a path with one more trailing segment.
    ///
    /// A single leading and trailing separator is stripped from `segment`
    /// first; separators left inside it split it into several segments.
    /// Blank input returns an equal path.
    pub fn append(&self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref().replace('\\', "/");
        let trimmed = strip_trailing(strip_leading(&segment));
        if is_blank(trimmed) {
            return self.clone();
        }

        let mut segments = self.segments.clone();
        segments.extend(split_segments(trimmed));
        Self::from_parts(self.absolute, segments)
    }

    /// Return this path rooted under `root`.
    ///
    /// The root loses a single trailing separator and keeps a leading one, so
    /// prepending `/data/` to `a/b` yields `/data/a/b`. Blank input returns an
    /// equal path.
    pub fn prepend(&self, root: impl AsRef<str>) -> Self {
        let root = root.as_ref();
        if is_blank(root) {
            return self.clone();
        }

        Self::new(root).append(&self.normalized)
    }

    /// True if `pattern` matches the whole normalized string.
    pub fn matches(&self, pattern: &PathPattern) -> bool {
        pattern.is_match(&self.normalized)
    }

    /// Get the normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// The individual non-blank segments, root segments included.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if the path starts with a separator.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.normalized)
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is an existing directory without entries.
    pub fn is_empty_dir(&self) -> bool {
        std::fs::read_dir(self.to_native())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }

    fn from_parts(absolute: bool, segments: Vec<String>) -> Self {
        let mut normalized = String::new();
        if absolute {
            normalized.push(SEPARATOR);
        }
        normalized.push_str(&segments.join("/"));
        Self {
            absolute,
            segments,
            normalized,
        }
    }
}

impl PartialEq for IdentityPath {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for IdentityPath {}

impl Hash for IdentityPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl AsRef<Path> for IdentityPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.normalized)
    }
}

impl fmt::Display for IdentityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

impl From<&str> for IdentityPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IdentityPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for IdentityPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<PathBuf> for IdentityPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

/// A regular expression that must match a whole path string.
///
/// Keeps the source text so log lines can name the pattern that fired.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// Compile `source`, anchoring it at both ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source` is not a valid regex.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| Error::InvalidPattern {
            pattern: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    /// The pattern as written by the user.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern matches all of `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl FromStr for PathPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn strip_leading(s: &str) -> &str {
    s.strip_prefix(SEPARATOR).unwrap_or(s)
}

fn strip_trailing(s: &str) -> &str {
    s.strip_suffix(SEPARATOR).unwrap_or(s)
}

fn split_segments(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(SEPARATOR)
        .filter(|segment| !is_blank(segment))
        .map(str::to_string)
}
