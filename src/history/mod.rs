//! Version-control history access.
//!
//! The reconciliation engine needs "this file's bytes as of timestamp T"
//! to reconstruct the local-at-last-sync baseline. [`HistoryReader`] is
//! the seam; [`GitHistory`] is the production implementation, shelling
//! out to git. "File absent at that timestamp" is `Ok(None)` — only a
//! broken history pipeline is an error.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::HistoryError;

/// Read a file's content as it existed in history at or before a timestamp.
pub trait HistoryReader {
    /// Returns `Ok(None)` when the file did not exist at `at`; `Err` only
    /// on history access failure.
    fn file_at_timestamp(
        &self,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>, HistoryError>;
}

/// Git-backed history reader rooted at a working tree.
#[derive(Debug, Clone)]
pub struct GitHistory {
    worktree: PathBuf,
}

impl GitHistory {
    #[must_use]
    pub fn new(worktree: impl Into<PathBuf>) -> Self {
        Self {
            worktree: worktree.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<std::process::Output, HistoryError> {
        Command::new("git")
            .arg("-C")
            .arg(&self.worktree)
            .args(args)
            .output()
            .map_err(HistoryError::Spawn)
    }

    /// Path relative to the worktree, as git wants it.
    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.worktree).unwrap_or(path)
    }
}

impl HistoryReader for GitHistory {
    fn file_at_timestamp(
        &self,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>, HistoryError> {
        let rel = self.relative(path);
        let rel_str = rel.to_string_lossy();
        let before = at.to_rfc3339_opts(SecondsFormat::Secs, true);

        // Last commit touching the path at or before the timestamp.
        let output = self.git(&[
            "rev-list",
            "-1",
            &format!("--before={before}"),
            "HEAD",
            "--",
            &rel_str,
        ])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Err(HistoryError::NotARepository {
                    path: self.worktree.clone(),
                });
            }
            return Err(HistoryError::Command {
                command: "rev-list".to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if rev.is_empty() {
            // No commit touched this path before the timestamp.
            return Ok(None);
        }

        let show = self.git(&["show", &format!("{rev}:{rel_str}")])?;
        if show.status.success() {
            return Ok(Some(show.stdout));
        }

        let stderr = String::from_utf8_lossy(&show.stderr);
        // The commit touched the path but the blob is absent there: the
        // touch was a deletion, so the file did not exist at `at`.
        if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
            tracing::debug!("{} absent at {rev}", rel.display());
            return Ok(None);
        }

        Err(HistoryError::Command {
            command: "show".to_string(),
            stderr: stderr.trim().to_string(),
        })
    }
}
