//! MD5 fingerprint utilities
//!
//! Fingerprints are 128-bit MD5 digests rendered as 32 lowercase hex
//! characters, the same form note providers report for attachment bodies, so
//! local and remote entries can be compared directly.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};

/// Fingerprint of zero bytes. Used for directories and other non-regular entries.
pub const EMPTY_FINGERPRINT: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// Compute the fingerprint of in-memory content.
pub fn fingerprint_bytes(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

/// Compute the fingerprint of a file's contents, reading it in chunks.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
