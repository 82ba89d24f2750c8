//! ID generation for issues and projects.
//!
//! Ids are 8-character opaque strings in base36 lowercase (0-9, a-z),
//! derived from a SHA-256 seed over title, creation time and a nonce.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Fixed id width.
pub const ID_LENGTH: usize = 8;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build the deterministic seed string for an id.
fn id_seed(title: &str, created_at: DateTime<Utc>, nonce: u32) -> String {
    format!("{title}\x00{}\x00{nonce}", created_at.to_rfc3339())
}

/// Hash a seed down to `ID_LENGTH` base36 characters.
fn hash_to_base36(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());

    digest
        .iter()
        .map(|b| char::from(BASE36[usize::from(*b) % 36]))
        .take(ID_LENGTH)
        .collect()
}

/// Generate a candidate id for the given title and creation time.
#[must_use]
pub fn candidate(title: &str, created_at: DateTime<Utc>, nonce: u32) -> String {
    hash_to_base36(&id_seed(title, created_at, nonce))
}

/// Generate an id, probing nonces until `exists` reports it free.
pub fn generate<F>(title: &str, created_at: DateTime<Utc>, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut nonce = 0;
    loop {
        let id = candidate(title, created_at, nonce);
        if !exists(&id) {
            return id;
        }
        nonce += 1;
    }
}

/// Check that a string is a well-formed id.
#[must_use]
pub fn is_valid(id: &str) -> bool {
    id.len() == ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn candidate_is_deterministic() {
        assert_eq!(candidate("Fix bug", t0(), 0), candidate("Fix bug", t0(), 0));
    }

    #[test]
    fn candidate_varies_with_inputs() {
        assert_ne!(candidate("Fix bug", t0(), 0), candidate("Fix bug", t0(), 1));
        assert_ne!(candidate("Fix bug", t0(), 0), candidate("Other", t0(), 0));
    }

    #[test]
    fn candidate_shape() {
        let id = candidate("Fix bug", t0(), 0);
        assert!(is_valid(&id), "unexpected id: {id}");
    }

    #[test]
    fn generate_probes_past_collisions() {
        let taken = candidate("Fix bug", t0(), 0);
        let id = generate("Fix bug", t0(), |candidate| candidate == taken);
        assert_ne!(id, taken);
        assert!(is_valid(&id));
    }

    #[test]
    fn is_valid_rejects_bad_shapes() {
        assert!(!is_valid("short"));
        assert!(!is_valid("UPPERCASE1"));
        assert!(!is_valid("has space"));
        assert!(is_valid("a1b2c3d4"));
    }
}
