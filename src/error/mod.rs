//! Error types for `docket`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - `ParseError` is a separate, recoverable per-file error so bulk
//!   operations can skip a broken file while single-entity operations
//!   fail loudly
//! - `HistoryError` covers version-control access failures; "file absent
//!   at that timestamp" is `Ok(None)`, never an error
//! - Provides recovery hints for user-facing errors

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `docket` operations.
#[derive(Error, Debug)]
pub enum DocketError {
    // === Workspace Errors ===
    /// Workspace directory not found anywhere up the tree.
    #[error("Docket not initialized: run 'dk init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === Entity Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    /// Milestone with the specified name was not found.
    #[error("Milestone not found: {name}")]
    MilestoneNotFound { name: String },

    /// Project with the specified ID was not found.
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    /// Partial ID matches multiple entities.
    #[error("Ambiguous ID '{partial}': matches {matches:?}")]
    AmbiguousId {
        partial: String,
        matches: Vec<String>,
    },

    /// Attempted to create an entity whose ID already exists.
    #[error("ID collision: {id}")]
    IdCollision { id: String },

    /// A named entity file failed to parse.
    #[error("Failed to parse {path}: {source}")]
    EntityParse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === Sync Errors ===
    /// Version-control history could not be read.
    #[error(transparent)]
    History(#[from] HistoryError),

    // === Index Errors ===
    /// `SQLite` database error.
    #[error("Index error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error for glue code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Recoverable per-file parse error produced by the entity codec.
///
/// Bulk callers (the index builder, listings) catch this per file and
/// skip; direct lookups raise it wrapped in [`DocketError::EntityParse`].
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file does not start with a `---` metadata delimiter.
    #[error("missing metadata block")]
    MissingMetadata,

    /// The opening `---` has no matching closing delimiter.
    #[error("unterminated metadata block")]
    UnterminatedMetadata,

    /// The metadata block is not valid YAML.
    #[error("malformed metadata: {reason}")]
    Malformed { reason: String },

    /// A required field is absent from the metadata block.
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// Invalid status value.
    #[error("invalid status '{value}' (expected: todo, in-progress, blocked, done)")]
    InvalidStatus { value: String },

    /// Invalid priority value.
    #[error("invalid priority '{value}' (expected: critical, high, medium, low)")]
    InvalidPriority { value: String },

    /// Invalid milestone or project state value.
    #[error("invalid state '{value}'")]
    InvalidState { value: String },

    /// A timestamp field is not RFC 3339.
    #[error("invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },
}

impl ParseError {
    /// Create a missing-field error.
    #[must_use]
    pub fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Malformed {
            reason: err.to_string(),
        }
    }
}

/// Version-control history access failure.
///
/// Absence of a file at a timestamp is NOT an error; retrievers return
/// `Ok(None)` for that case. These variants indicate a broken system.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The workspace is not inside a git repository.
    #[error("not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// The git binary could not be spawned.
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// git exited non-zero for a reason other than "path not found".
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
}

impl DocketError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::AlreadyInitialized { .. }
                | Self::IssueNotFound { .. }
                | Self::MilestoneNotFound { .. }
                | Self::ProjectNotFound { .. }
                | Self::AmbiguousId { .. }
                | Self::Validation { .. }
                | Self::EntityParse { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: dk init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::AmbiguousId { .. } => Some("Provide more characters of the ID"),
            Self::EntityParse { .. } => Some("Fix the file's metadata block and retry"),
            Self::History(_) => Some("Check that the workspace is inside a git repository"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using `DocketError`.
pub type Result<T> = std::result::Result<T, DocketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocketError::IssueNotFound {
            id: "a1b2c3d4".to_string(),
        };
        assert_eq!(err.to_string(), "Issue not found: a1b2c3d4");
    }

    #[test]
    fn test_validation_error() {
        let err = DocketError::validation("title", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: title: cannot be empty");
    }

    #[test]
    fn test_parse_error_wrapping() {
        let err = DocketError::EntityParse {
            path: PathBuf::from("issues/backlog/x.md"),
            source: ParseError::missing("title"),
        };
        assert!(err.to_string().contains("missing required field 'title'"));
        assert!(err.is_user_recoverable());
    }

    #[test]
    fn test_suggestion() {
        let err = DocketError::NotInitialized;
        assert_eq!(err.suggestion(), Some("Run: dk init"));

        let err = DocketError::AmbiguousId {
            partial: "a1".to_string(),
            matches: vec!["a1b2c3d4".to_string(), "a1ffee00".to_string()],
        };
        assert_eq!(err.suggestion(), Some("Provide more characters of the ID"));
    }

    #[test]
    fn test_history_error_display() {
        let err = HistoryError::Command {
            command: "rev-list".to_string(),
            stderr: "fatal: bad revision".to_string(),
        };
        assert_eq!(err.to_string(), "git rev-list failed: fatal: bad revision");
    }
}
