//! Content hash of the primary source.
//!
//! A plan records the SHA-256 of the file it was made from so that `build`
//! refuses to splice tags from a file that has changed since.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Lowercase hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::source_unavailable(path.display(), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut BufReader::new(file), &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Fail with [`Error::Integrity`] unless the file hashes to `expected`.
pub fn verify(path: &Path, expected: &str) -> Result<()> {
    let actual = file_digest(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(Error::Integrity {
            expected: expected.to_string(),
            actual,
        });
    }
    tracing::debug!("Hash of {} verified", path.display());
    Ok(())
}
