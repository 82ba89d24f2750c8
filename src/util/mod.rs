//! Shared helpers: content fingerprints and name/slug normalization.

pub mod cache;
pub mod id;
pub mod time;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("valid regex"));

/// SHA-256 hex digest of raw file bytes, used for index change detection.
#[must_use]
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Normalize a title into a filename slug: lowercase, runs of
/// non-alphanumerics collapsed to single dashes, trimmed, capped at 60
/// characters so filenames stay manageable.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = NON_SLUG.replace_all(&lowered, "-");
    let collapsed = DASH_RUN.replace_all(&dashed, "-");
    let trimmed = collapsed.trim_matches('-');

    let slug: String = trimmed.chars().take(60).collect();
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Normalize a milestone name into its identity form.
///
/// Same rules as [`slugify`] but uncapped: the normalized name IS the
/// milestone's identity, so truncation would merge distinct milestones.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let dashed = NON_SLUG.replace_all(&lowered, "-");
    let collapsed = DASH_RUN.replace_all(&dashed, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}
