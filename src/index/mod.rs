//! Query index and change detector.
//!
//! A SQLite mirror of the entity files for fast filtering and listing.
//! The index is never authoritative: rows carry a SHA-256 content
//! fingerprint purely for change detection, and the whole database can
//! be discarded and rebuilt from the files with no data loss.
//!
//! Refresh is incremental: only files whose fingerprint changed are
//! re-parsed, rows for deleted paths are removed, and each file's upsert
//! runs in its own short transaction so a failure never corrupts
//! previously-good rows. A file the codec rejects is skipped (logged)
//! and its prior row stays until the file is fixed.

pub mod schema;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{DocketError, ParseError, Result};
use crate::model::{Entity, EntityKind};
use crate::store::{EntityFile, Workspace};
use crate::util::content_fingerprint;

/// SQLite-backed query index.
#[derive(Debug)]
pub struct Index {
    conn: Connection,
}

/// One denormalized row of the index.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IndexRecord {
    pub kind: EntityKind,
    pub id: String,
    pub path: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Files that differ from the index, detected by content fingerprint.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub added: Vec<EntityFile>,
    pub modified: Vec<EntityFile>,
    /// Paths with an index row but no file on disk.
    pub removed: Vec<String>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of a refresh pass.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Files re-parsed and upserted.
    pub indexed: usize,
    /// Rows removed for deleted files.
    pub removed: usize,
    /// Files skipped because the codec rejected them.
    pub skipped: Vec<(PathBuf, ParseError)>,
}

/// Listing filter; all fields are conjunctive.
#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    pub kind: Option<EntityKind>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub milestone: Option<String>,
    pub label: Option<String>,
}

impl Index {
    /// Open (or create) the index database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(5_000))?;
        schema::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory index for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Compare stored fingerprints against the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem or database failures.
    pub fn plan(&self, workspace: &Workspace) -> Result<ChangeSet> {
        let mut stored: HashMap<String, String> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT path, fingerprint FROM entities")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (path, fingerprint) = row?;
                stored.insert(path, fingerprint);
            }
        }

        let mut change_set = ChangeSet::default();
        let mut seen: Vec<String> = Vec::new();

        for file in workspace.scan()? {
            let key = file.path.to_string_lossy().to_string();
            let bytes = fs::read(&file.path)?;
            let fingerprint = content_fingerprint(&bytes);

            match stored.get(&key) {
                None => change_set.added.push(file),
                Some(prior) if *prior != fingerprint => change_set.modified.push(file),
                Some(_) => {}
            }
            seen.push(key);
        }

        for path in stored.into_keys() {
            if !seen.contains(&path) {
                change_set.removed.push(path);
            }
        }

        Ok(change_set)
    }

    /// True when any file differs from the index.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem or database failures.
    pub fn is_stale(&self, workspace: &Workspace) -> Result<bool> {
        Ok(!self.plan(workspace)?.is_empty())
    }

    /// Bring the index up to date with the files.
    ///
    /// With `force` (or an empty index) every file is re-parsed;
    /// otherwise only changed files are. Each upsert is an independent
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error on database failures; per-file parse failures are
    /// reported in the [`RefreshReport`] instead.
    pub fn refresh(&mut self, workspace: &Workspace, force: bool) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();

        let full = force || self.row_count()? == 0;
        let (to_index, removed) = if full {
            self.conn.execute("DELETE FROM entities", [])?;
            (workspace.scan()?, Vec::new())
        } else {
            let plan = self.plan(workspace)?;
            let mut files = plan.added;
            files.extend(plan.modified);
            (files, plan.removed)
        };

        for file in to_index {
            let bytes = fs::read(&file.path)?;
            let fingerprint = content_fingerprint(&bytes);
            let content = String::from_utf8_lossy(&bytes);

            match crate::codec::parse_entity(file.kind, &content) {
                Ok(entity) => {
                    self.upsert(&entity, &file.path, &fingerprint)?;
                    report.indexed += 1;
                }
                Err(err) => {
                    tracing::warn!("index skip {}: {err}", file.path.display());
                    report.skipped.push((file.path, err));
                }
            }
        }

        for path in removed {
            report.removed += self.conn.execute(
                "DELETE FROM entities WHERE path = ?",
                [path],
            )?;
        }

        Ok(report)
    }

    /// Upsert one entity row in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error on database failures.
    pub fn upsert(&mut self, entity: &Entity, path: &Path, fingerprint: &str) -> Result<()> {
        let tx = self.conn.transaction()?;

        let (priority, assignee, milestone, summary, labels, estimated_minutes) = match entity {
            Entity::Issue(issue) => (
                Some(issue.priority.as_str().to_string()),
                issue.assignee.clone(),
                issue.milestone.clone(),
                issue.summary.clone(),
                serde_json::to_string(&issue.labels)?,
                issue.estimated_minutes,
            ),
            Entity::Milestone(_) | Entity::Project(_) => {
                (None, None, None, None, "[]".to_string(), None)
            }
        };

        let status = match entity {
            Entity::Issue(issue) => issue.status.as_str().to_string(),
            Entity::Milestone(m) => m.state.as_str().to_string(),
            Entity::Project(p) => p.state.as_str().to_string(),
        };

        let created = match entity {
            Entity::Issue(i) => i.created,
            Entity::Milestone(m) => m.created,
            Entity::Project(p) => p.created,
        };

        tx.execute(
            "INSERT OR REPLACE INTO entities (
                kind, id, path, title, status, priority, assignee, milestone,
                summary, labels, estimated_minutes, created_at, updated_at, fingerprint
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                entity.kind().as_str(),
                entity.id(),
                path.to_string_lossy(),
                entity.title(),
                status,
                priority,
                assignee,
                milestone,
                summary,
                labels,
                estimated_minutes,
                created.to_rfc3339(),
                entity.updated().to_rfc3339(),
                fingerprint,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// List records matching the filter, newest-updated first.
    ///
    /// # Errors
    ///
    /// Returns an error on database failures.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<IndexRecord>> {
        let mut sql = String::from(
            "SELECT kind, id, path, title, status, priority, assignee, milestone,
                    summary, labels, estimated_minutes, created_at, updated_at
             FROM entities WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(kind) = filter.kind {
            sql.push_str(" AND kind = ?");
            params.push(Box::new(kind.as_str().to_string()));
        }
        if let Some(ref status) = filter.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.clone()));
        }
        if let Some(ref assignee) = filter.assignee {
            sql.push_str(" AND assignee = ?");
            params.push(Box::new(assignee.clone()));
        }
        if let Some(ref milestone) = filter.milestone {
            sql.push_str(" AND milestone = ?");
            params.push(Box::new(milestone.clone()));
        }
        sql.push_str(" ORDER BY updated_at DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            row_to_record,
        )?;

        let mut records = Vec::new();
        for row in rows {
            let record = row?;
            // Label filtering happens here; labels live in one JSON column.
            if let Some(ref label) = filter.label {
                if !record.labels.iter().any(|l| l == label) {
                    continue;
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Resolve a (possibly partial) issue id to its full id and path.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::IssueNotFound`] for zero matches and
    /// [`DocketError::AmbiguousId`] for more than one.
    pub fn resolve_issue(&self, partial: &str) -> Result<(String, PathBuf)> {
        if let Some(exact) = self
            .conn
            .query_row(
                "SELECT id, path FROM entities WHERE kind = 'issue' AND id = ?",
                [partial],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
        {
            return Ok((exact.0, PathBuf::from(exact.1)));
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, path FROM entities WHERE kind = 'issue' AND id LIKE ? ORDER BY id",
        )?;
        let matches: Vec<(String, String)> = stmt
            .query_map([format!("{partial}%")], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        match matches.len() {
            0 => Err(DocketError::IssueNotFound {
                id: partial.to_string(),
            }),
            1 => Ok((matches[0].0.clone(), PathBuf::from(&matches[0].1))),
            _ => Err(DocketError::AmbiguousId {
                partial: partial.to_string(),
                matches: matches.into_iter().map(|(id, _)| id).collect(),
            }),
        }
    }

    /// Path of the row for `(kind, id)`, if indexed.
    ///
    /// # Errors
    ///
    /// Returns an error on database failures.
    pub fn path_of(&self, kind: EntityKind, id: &str) -> Result<Option<PathBuf>> {
        let path: Option<String> = self
            .conn
            .query_row(
                "SELECT path FROM entities WHERE kind = ? AND id = ?",
                [kind.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(path.map(PathBuf::from))
    }

    /// Distinct assignees present in the index.
    ///
    /// # Errors
    ///
    /// Returns an error on database failures.
    pub fn assignees(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT assignee FROM entities
             WHERE assignee IS NOT NULL ORDER BY assignee",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    fn row_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexRecord> {
    let kind_str: String = row.get(0)?;
    let kind = match kind_str.as_str() {
        "milestone" => EntityKind::Milestone,
        "project" => EntityKind::Project,
        _ => EntityKind::Issue,
    };
    let labels_json: String = row.get(9)?;
    let labels: Vec<String> = serde_json::from_str(&labels_json).unwrap_or_default();

    Ok(IndexRecord {
        kind,
        id: row.get(1)?,
        path: row.get(2)?,
        title: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        assignee: row.get(6)?,
        milestone: row.get(7)?,
        summary: row.get(8)?,
        labels,
        estimated_minutes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
