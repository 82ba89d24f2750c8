//! Explicit TTL-checked value cache.
//!
//! Replaces process-wide mutable caches with a value carried by whoever
//! needs it: a `CachedValue` pairs the data with its fetch time, and the
//! owner decides freshness against a TTL.

use chrono::{DateTime, Duration, Utc};

/// A value plus the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CachedValue<T> {
    /// Wrap a freshly fetched value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
        }
    }

    /// True while the value is younger than `ttl`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        Utc::now() - self.fetched_at < ttl
    }
}

/// Directory of assignee names already present in the index, used to
/// canonicalize user input (case-insensitive match against known names).
#[derive(Debug)]
pub struct AssigneeDirectory {
    cached: Option<CachedValue<Vec<String>>>,
    ttl: Duration,
}

impl AssigneeDirectory {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { cached: None, ttl }
    }

    /// Canonicalize `name` against the known assignees, fetching the list
    /// at most once per TTL window via `fetch`.
    ///
    /// An unknown name is returned as given; a case-insensitive match to a
    /// known name returns the known spelling.
    pub fn canonical<F>(&mut self, name: &str, fetch: F) -> String
    where
        F: FnOnce() -> Vec<String>,
    {
        let stale = !self
            .cached
            .as_ref()
            .is_some_and(|c| c.is_fresh(self.ttl));
        if stale {
            self.cached = Some(CachedValue::new(fetch()));
        }

        let known = self.cached.as_ref().map_or(&[][..], |c| &c.value[..]);
        known
            .iter()
            .find(|existing| existing.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn cached_value_freshness() {
        let cached = CachedValue::new(42);
        assert!(cached.is_fresh(Duration::minutes(5)));
        assert!(!cached.is_fresh(Duration::zero()));
    }

    #[test]
    fn canonical_matches_case_insensitively() {
        let mut dir = AssigneeDirectory::new(Duration::minutes(5));
        let name = dir.canonical("ALICE", || vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(name, "alice");
    }

    #[test]
    fn canonical_passes_through_unknown() {
        let mut dir = AssigneeDirectory::new(Duration::minutes(5));
        let name = dir.canonical("carol", || vec!["alice".to_string()]);
        assert_eq!(name, "carol");
    }

    #[test]
    fn fetch_happens_once_within_ttl() {
        let calls = Cell::new(0);
        let mut dir = AssigneeDirectory::new(Duration::minutes(5));

        for _ in 0..3 {
            dir.canonical("alice", || {
                calls.set(calls.get() + 1);
                vec!["alice".to_string()]
            });
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn zero_ttl_refetches() {
        let calls = Cell::new(0);
        let mut dir = AssigneeDirectory::new(Duration::zero());

        for _ in 0..2 {
            dir.canonical("alice", || {
                calls.set(calls.get() + 1);
                vec!["alice".to_string()]
            });
        }
        assert_eq!(calls.get(), 2);
    }
}
