//! Filesystem layer for notesync
//!
//! Provides identity paths, content fingerprints and the handful of I/O
//! operations a reconciliation plan needs.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{EMPTY_FINGERPRINT, fingerprint_bytes, fingerprint_file};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::{IdentityPath, PathPattern};
