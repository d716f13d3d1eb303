use sha2::{Digest, Sha256};
use std::{fs, path::Path};

use crate::install::error::ResolveError;

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Fingerprint an installed executable.
///
/// The identity depends only on the file bytes, so a reused binary and a
/// freshly installed copy of the same release report the same digest.
pub fn fingerprint_file(path: &Path) -> Result<String, ResolveError> {
    let bytes = fs::read(path).map_err(ResolveError::filesystem(path))?;
    Ok(sha256_hex(&bytes))
}
