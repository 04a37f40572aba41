//! Content fingerprinting for de-duplication
//!
//! Identity is a SHA-256 digest over the first 8 KiB of the file, not the
//! whole file: renames and moves keep the same digest, and two distinct
//! personal photos sharing an identical 8 KiB prefix are vanishingly
//! unlikely. This is a cheap probabilistic identity, not cryptographic
//! de-duplication; callers must tolerate prefix collisions.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes of file prefix fed to the digest
pub const FINGERPRINT_PREFIX_LEN: usize = 8192;

/// Digest the first 8 KiB of `path`, hex encoded
///
/// On any open/read failure the path string itself is returned as a
/// degraded fallback identity. A fallback identity only ever matches the
/// same path, so duplicates of an unreadable file are caught by the path
/// check alone.
pub fn content_fingerprint(path: &Path) -> String {
    match fingerprint_prefix(path) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Failed to hash file, falling back to path identity: {}",
                e
            );
            path.display().to_string()
        }
    }
}

fn fingerprint_prefix(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; FINGERPRINT_PREFIX_LEN];

    // A single read may return short even mid-file; fill until EOF or the
    // prefix bound is reached.
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let mut hasher = Sha256::new();
    hasher.update(&buffer[..filled]);
    Ok(format!("{:x}", hasher.finalize()))
}
