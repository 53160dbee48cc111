//! Content-addressed body file names.

use sha2::{Digest, Sha256};

use crate::models::RequestKey;

/// File name for a stored body. Derived from both the key and the body so a
/// replacement never overwrites the file the committed index still points at.
pub fn body_file_name(key: &RequestKey, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(body);
    format!("{}.body", hex::encode(hasher.finalize()))
}
