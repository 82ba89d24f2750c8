//! Baseline state retrieval.
//!
//! A `Baseline` is the reduced view of an issue that reconciliation
//! compares: three of them exist conceptually — the file as it is now,
//! the file as it was at `last_synced` (via version-control history),
//! and the remote system as it was at `last_synced` (via the embedded
//! `remote_state` snapshot).
//!
//! Baseline retrieval is advisory input, not a source of truth: parse
//! failures degrade to `None` plus a warning. The one exception is a
//! history *access* failure, which is raised — treating a broken history
//! pipeline as "no baseline" could mask a real reconciliation gap.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::codec;
use crate::error::Result;
use crate::history::HistoryReader;
use crate::model::{Issue, RemoteState, Status};
use crate::util::time::parse_lenient_timestamp;

/// Reduced snapshot of an issue's reconciliation-relevant fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub assignee: Option<String>,
    pub milestone: Option<String>,
    pub summary: Option<String>,
    pub body: String,
    pub labels: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Issue> for Baseline {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status,
            assignee: issue.assignee.clone(),
            milestone: issue.milestone.clone(),
            summary: issue.summary.clone(),
            body: issue.body.clone(),
            labels: issue.labels.clone(),
            updated_at: issue.updated,
        }
    }
}

impl From<&RemoteState> for Baseline {
    fn from(remote: &RemoteState) -> Self {
        Self {
            id: remote.id.clone(),
            title: remote.title.clone(),
            status: remote.status,
            assignee: remote.assignee.clone(),
            milestone: remote.milestone.clone(),
            summary: remote.summary.clone(),
            body: remote.body.clone(),
            labels: remote.labels.clone(),
            updated_at: parse_lenient_timestamp(&remote.updated_at),
        }
    }
}

/// The three snapshots reconciliation consumes.
#[derive(Debug, Clone)]
pub struct BaselineSet {
    pub current: Baseline,
    pub local_at_sync: Option<Baseline>,
    pub remote_at_sync: Option<Baseline>,
}

/// The file's state at `last_synced`, via version-control history.
///
/// Returns `Ok(None)` when the file did not exist at that time — the
/// entity may simply not have existed yet. Historical content that no
/// longer parses degrades to `Ok(None)` with a warning.
///
/// # Errors
///
/// Propagates history *access* failures untouched.
pub fn local_baseline(
    history: &dyn HistoryReader,
    path: &Path,
    last_synced: DateTime<Utc>,
) -> Result<Option<Baseline>> {
    let Some(bytes) = history.file_at_timestamp(path, last_synced)? else {
        return Ok(None);
    };

    let content = String::from_utf8_lossy(&bytes);
    match codec::parse_issue(&content) {
        Ok(issue) => Ok(Some(Baseline::from(&issue))),
        Err(err) => {
            tracing::warn!(
                "historical copy of {} does not parse ({err}); treating as no baseline",
                path.display()
            );
            Ok(None)
        }
    }
}

/// The remote system's state at `last_synced`, from the embedded snapshot.
///
/// Returns `None` when no sync metadata or no `remote_state` exists.
#[must_use]
pub fn remote_baseline(issue: &Issue) -> Option<Baseline> {
    issue
        .sync
        .as_ref()
        .and_then(|sync| sync.remote_state.as_ref())
        .map(Baseline::from)
}

/// The current file reduced to a baseline, for bootstrap only.
///
/// Any failure degrades to `None` plus a warning.
#[must_use]
pub fn baseline_from_file(path: &Path) -> Option<Baseline> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("cannot read {} for bootstrap baseline: {err}", path.display());
            return None;
        }
    };
    match codec::parse_issue(&content) {
        Ok(issue) => Some(Baseline::from(&issue)),
        Err(err) => {
            tracing::warn!("cannot parse {} for bootstrap baseline: {err}", path.display());
            None
        }
    }
}

/// Assemble the three baselines for one issue.
///
/// Before a first successful sync (no sync metadata), both historical
/// baselines collapse to the current file's state so no false conflicts
/// are reported.
///
/// # Errors
///
/// Propagates history access failures.
pub fn load_baselines(
    history: &dyn HistoryReader,
    path: &Path,
    issue: &Issue,
) -> Result<BaselineSet> {
    let current = Baseline::from(issue);

    let Some(last_synced) = issue.sync.as_ref().map(|sync| sync.last_synced) else {
        let bootstrap = baseline_from_file(path).or_else(|| Some(current.clone()));
        return Ok(BaselineSet {
            current,
            local_at_sync: bootstrap.clone(),
            remote_at_sync: bootstrap,
        });
    };

    let local_at_sync = local_baseline(history, path, last_synced)?;
    let remote_at_sync = remote_baseline(issue);

    Ok(BaselineSet {
        current,
        local_at_sync,
        remote_at_sync,
    })
}
