//! Streaming digest computation for manifest verification.
//!
//! The digest primitive is deliberately replaceable: the manifest format
//! fixes a 40-character hex digest, and everything above this module only
//! sees hex strings. Files are streamed in fixed-size chunks so arbitrarily
//! large artifacts hash in constant memory, and the same defensive limits
//! applied to every other untrusted read apply here: symlinks are refused
//! and a hard size cap bounds the work an adversarial artifact can cause.

use sha1::{Digest, Sha1};
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

/// Length of a manifest digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 40;

/// Maximum size of any single artifact we will hash (100MB).
const MAX_ARTIFACT_SIZE: u64 = 100 * 1024 * 1024;

const CHUNK_SIZE: usize = 64 * 1024;

fn guard_error(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Streams `path` through the digest accumulator and returns the lowercase
/// hex digest.
///
/// Refuses symlinks and files larger than [`MAX_ARTIFACT_SIZE`]; both
/// surface as `io::Error` so callers treat them exactly like any other
/// unreadable artifact. A missing file surfaces as `ErrorKind::NotFound`.
///
/// NOTE: narrow TOCTOU window between `symlink_metadata()` and `open()`.
/// The check still catches accidental symlinks and raises the bar for
/// exploitation.
pub fn compute_digest(path: &Path) -> io::Result<String> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Err(guard_error(format!(
            "refusing to hash symlink: {}",
            path.display()
        )));
    }
    if meta.len() > MAX_ARTIFACT_SIZE {
        return Err(guard_error(format!(
            "file too large: {} ({} bytes, max {} bytes)",
            path.display(),
            meta.len(),
            MAX_ARTIFACT_SIZE
        )));
    }

    let mut f = fs::File::open(path)?;
    let mut h = Sha1::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }
    Ok(hex::encode(h.finalize()))
}

/// Case-insensitive digest equality over the full value.
///
/// Digests are not secrets, so there is no side-channel requirement, but
/// the comparison always consumes the entire value rather than stopping at
/// the first differing prefix: equality must never depend on how far a
/// stale or truncated digest happens to agree. Length mismatch is never
/// equal.
pub fn digests_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(true, |eq, (x, y)| eq & (x.to_ascii_lowercase() == y.to_ascii_lowercase()))
}
