//! Three-way reconciliation policy.
//!
//! Given the three baselines of an issue, classify each comparable field
//! independently:
//!
//! - unchanged both sides: no action
//! - local changed only: candidate to push
//! - remote changed only: candidate to pull
//! - both changed to the same value: convergent, no action
//! - both changed to different values: conflict, surfaced for manual
//!   resolution, never silently overwritten in either direction
//!
//! The policy is field-by-field because independent fields (status vs.
//! assignee) commonly diverge without true conflict. Applying a push or
//! pull to the remote system is delegated externally; this module only
//! classifies.

pub mod baseline;

use serde::Serialize;
use std::fmt;

pub use baseline::{
    Baseline, BaselineSet, baseline_from_file, load_baselines, local_baseline, remote_baseline,
};

/// A field the reconciliation policy compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncField {
    Status,
    Assignee,
    Milestone,
    Summary,
    Labels,
}

impl SyncField {
    pub const ALL: [Self; 5] = [
        Self::Status,
        Self::Assignee,
        Self::Milestone,
        Self::Summary,
        Self::Labels,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Assignee => "assignee",
            Self::Milestone => "milestone",
            Self::Summary => "summary",
            Self::Labels => "labels",
        }
    }
}

impl fmt::Display for SyncField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of comparing one field across the three baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Unchanged,
    /// Local changed since last sync; push candidate.
    LocalOnly,
    /// Remote changed since last sync; pull candidate.
    RemoteOnly,
    /// Both sides changed to the same value; already resolved.
    Convergent,
    /// Both sides changed to different values; needs resolution.
    Conflict,
}

impl Classification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::LocalOnly => "local-only",
            Self::RemoteOnly => "remote-only",
            Self::Convergent => "convergent",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One field's classification with its rendered values for display.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDelta {
    pub field: SyncField,
    pub classification: Classification,
    /// Current local value, rendered.
    pub local: String,
    /// Last-known remote value, rendered.
    pub remote: String,
}

/// Per-issue reconciliation report.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub id: String,
    pub deltas: Vec<FieldDelta>,
}

impl EntityReport {
    /// Fields whose local value should be pushed to the remote system.
    #[must_use]
    pub fn push_candidates(&self) -> Vec<&FieldDelta> {
        self.deltas
            .iter()
            .filter(|d| d.classification == Classification::LocalOnly)
            .collect()
    }

    /// Fields whose last-known remote value should be pulled locally.
    #[must_use]
    pub fn pull_candidates(&self) -> Vec<&FieldDelta> {
        self.deltas
            .iter()
            .filter(|d| d.classification == Classification::RemoteOnly)
            .collect()
    }

    /// Fields in conflict.
    #[must_use]
    pub fn conflicts(&self) -> Vec<&FieldDelta> {
        self.deltas
            .iter()
            .filter(|d| d.classification == Classification::Conflict)
            .collect()
    }

    /// True when every field is unchanged or convergent.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.deltas.iter().all(|d| {
            matches!(
                d.classification,
                Classification::Unchanged | Classification::Convergent
            )
        })
    }
}

/// Classify one field given its three point-in-time values.
pub fn classify<T: PartialEq>(current: &T, local_at_sync: &T, remote_at_sync: &T) -> Classification {
    let local_changed = current != local_at_sync;
    let remote_changed = remote_at_sync != local_at_sync;

    match (local_changed, remote_changed) {
        (false, false) => Classification::Unchanged,
        (true, false) => Classification::LocalOnly,
        (false, true) => Classification::RemoteOnly,
        (true, true) => {
            if current == remote_at_sync {
                Classification::Convergent
            } else {
                Classification::Conflict
            }
        }
    }
}

fn render_option(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn render_labels(labels: &[String]) -> String {
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(",")
    }
}

/// Classify every comparable field of one issue.
///
/// When the local anchor is missing (the entity did not exist at
/// `last_synced`) it falls back to the remote anchor, then to the
/// current state — so a freshly bootstrapped issue classifies as fully
/// unchanged rather than conflicted.
#[must_use]
pub fn reconcile(set: &BaselineSet) -> EntityReport {
    let current = &set.current;
    let anchor = set
        .local_at_sync
        .as_ref()
        .or(set.remote_at_sync.as_ref())
        .unwrap_or(current);
    let remote = set.remote_at_sync.as_ref().unwrap_or(anchor);

    let deltas = SyncField::ALL
        .iter()
        .map(|&field| {
            let (classification, local_value, remote_value) = match field {
                SyncField::Status => (
                    classify(&current.status, &anchor.status, &remote.status),
                    current.status.to_string(),
                    remote.status.to_string(),
                ),
                SyncField::Assignee => (
                    classify(&current.assignee, &anchor.assignee, &remote.assignee),
                    render_option(current.assignee.as_deref()),
                    render_option(remote.assignee.as_deref()),
                ),
                SyncField::Milestone => (
                    classify(&current.milestone, &anchor.milestone, &remote.milestone),
                    render_option(current.milestone.as_deref()),
                    render_option(remote.milestone.as_deref()),
                ),
                SyncField::Summary => (
                    classify(&current.summary, &anchor.summary, &remote.summary),
                    render_option(current.summary.as_deref()),
                    render_option(remote.summary.as_deref()),
                ),
                SyncField::Labels => (
                    classify(&current.labels, &anchor.labels, &remote.labels),
                    render_labels(&current.labels),
                    render_labels(&remote.labels),
                ),
            };
            FieldDelta {
                field,
                classification,
                local: local_value,
                remote: remote_value,
            }
        })
        .collect();

    EntityReport {
        id: current.id.clone(),
        deltas,
    }
}
