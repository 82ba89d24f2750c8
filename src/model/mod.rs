//! Core data types for `docket`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Issue` - The core work item
//! - `Milestone` - A named grouping of issues with a due date
//! - `Project` - A long-lived container tracked alongside issues
//! - `Status` / `Priority` - Issue enums
//! - `SyncMetadata` / `RemoteState` - The embedded reconciliation anchor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Issue lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in-progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "done" => Ok(Self::Done),
            other => Err(ParseError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Issue priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(ParseError::InvalidPriority {
                value: other.to_string(),
            }),
        }
    }
}

/// Milestone lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    #[default]
    Open,
    Closed,
}

impl MilestoneState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for MilestoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MilestoneState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(ParseError::InvalidState {
                value: other.to_string(),
            }),
        }
    }
}

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectState {
    #[default]
    Active,
    Archived,
}

impl ProjectState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(ParseError::InvalidState {
                value: other.to_string(),
            }),
        }
    }
}

/// Frozen copy of the remote system's fields as observed at `last_synced`.
///
/// This is explicitly NOT current remote truth, only a reconciliation
/// anchor. `updated_at` stays a raw string so a hand-edited or truncated
/// value degrades gracefully instead of poisoning the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteState {
    pub id: String,
    pub title: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub updated_at: String,
}

/// Embedded per-entity sync anchor.
///
/// `last_synced` marks the last time local and remote were believed
/// reconciled. Lives inside the entity file so it travels with the file
/// under version control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub last_synced: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_state: Option<RemoteState>,
}

impl From<&Issue> for RemoteState {
    /// Freeze an issue's current fields as a remote snapshot, as handed
    /// back by the external applier after a successful sync.
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
            updated_at: issue.updated.to_rfc3339(),
        }
    }
}

/// The primary issue entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Stable 8-character opaque id.
    pub id: String,
    /// Title (1-500 chars).
    pub title: String,
    /// Workflow status.
    pub status: Status,
    /// Priority.
    pub priority: Priority,
    /// Assigned user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Grouping reference; `None` means backlog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    /// One-line headline, distinct from title and body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Estimated effort in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<i32>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp.
    pub updated: DateTime<Utc>,
    /// Embedded sync anchor; absent until a first successful sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncMetadata>,
    /// Free-text Markdown body.
    pub body: String,
}

impl Issue {
    /// Create a minimal issue with the given id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: Status::default(),
            priority: Priority::default(),
            assignee: None,
            milestone: None,
            summary: None,
            labels: Vec::new(),
            estimated_minutes: None,
            created: now,
            updated: now,
            sync: None,
            body: String::new(),
        }
    }

    /// The directory grouping this issue belongs under.
    #[must_use]
    pub fn group(&self) -> &str {
        self.milestone.as_deref().unwrap_or("backlog")
    }
}

/// A milestone entity, identified by its normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    /// Normalized name; doubles as the identity.
    pub name: String,
    /// Lifecycle state.
    pub state: MilestoneState,
    /// Due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp.
    pub updated: DateTime<Utc>,
    /// Free-text Markdown body.
    pub body: String,
}

/// A project entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Stable 8-character opaque id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Lifecycle state.
    pub state: ProjectState,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp.
    pub updated: DateTime<Utc>,
    /// Free-text Markdown body.
    pub body: String,
}

/// Entity kind discriminator, mirroring the on-disk directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Issue,
    Milestone,
    Project,
}

impl EntityKind {
    /// Directory name holding this kind of entity.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Issue => "issues",
            Self::Milestone => "milestones",
            Self::Project => "projects",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Milestone => "milestone",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Any entity stored as one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Issue(Issue),
    Milestone(Milestone),
    Project(Project),
}

impl Entity {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Issue(_) => EntityKind::Issue,
            Self::Milestone(_) => EntityKind::Milestone,
            Self::Project(_) => EntityKind::Project,
        }
    }

    /// Stable identifier: opaque id for issues/projects, name for milestones.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Issue(i) => &i.id,
            Self::Milestone(m) => &m.name,
            Self::Project(p) => &p.id,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Issue(i) => &i.title,
            Self::Milestone(m) => &m.name,
            Self::Project(p) => &p.title,
        }
    }

    #[must_use]
    pub const fn updated(&self) -> DateTime<Utc> {
        match self {
            Self::Issue(i) => i.updated,
            Self::Milestone(m) => m.updated,
            Self::Project(p) => p.updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_roundtrip() {
        for s in [Status::Todo, Status::InProgress, Status::Blocked, Status::Done] {
            assert_eq!(s.as_str().parse::<Status>().unwrap(), s);
        }
    }

    #[test]
    fn status_accepts_underscore_alias() {
        assert_eq!("in_progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("IN-PROGRESS".parse::<Status>().unwrap(), Status::InProgress);
    }

    #[test]
    fn status_rejects_unknown() {
        let err = "urgent".parse::<Status>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidStatus { .. }));
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::High < Priority::Low);
    }

    #[test]
    fn priority_rejects_unknown() {
        let err = "p1".parse::<Priority>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidPriority { .. }));
    }

    #[test]
    fn issue_group_defaults_to_backlog() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut issue = Issue::new("a1b2c3d4", "Test", now);
        assert_eq!(issue.group(), "backlog");

        issue.milestone = Some("v1".to_string());
        assert_eq!(issue.group(), "v1");
    }

    #[test]
    fn status_serde_kebab_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn entity_accessors() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let entity = Entity::Issue(Issue::new("a1b2c3d4", "Test", now));
        assert_eq!(entity.kind(), EntityKind::Issue);
        assert_eq!(entity.id(), "a1b2c3d4");
        assert_eq!(entity.title(), "Test");
    }
}
