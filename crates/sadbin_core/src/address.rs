//! Content-derived paste identifiers.
//!
//! A paste id is the lowercase hex SHA-1 of `author || title || content`.
//! Identical identity-bearing fields always map to the same id, which is what
//! makes resubmission idempotent.

use sha1::{Digest, Sha1};

/// Length in characters of every paste id.
pub const PASTE_ID_LEN: usize = 40;

/// Derive the canonical id for a submission.
///
/// Field order is fixed; an empty author and title reduce this to a digest of
/// the content alone.
pub fn address_of(author: &str, title: &str, content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(author.as_bytes());
    hasher.update(title.as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Whether `candidate` has the shape of a paste id (40 lowercase hex chars).
pub fn is_paste_id(candidate: &str) -> bool {
    candidate.len() == PASTE_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
