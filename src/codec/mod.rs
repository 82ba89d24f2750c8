//! Entity codec: one text file per entity.
//!
//! A file is a YAML metadata block between `---` delimiters, one blank
//! line, then the free-text Markdown body. Parsing produces a typed
//! [`ParseError`] per file so bulk callers can skip broken files;
//! serialization emits only non-null fields and the body verbatim.
//!
//! The embedded `sync_metadata` block is decoded leniently: a malformed
//! `last_synced`, an undecodable `remote_state`, or a remote id that does
//! not match the enclosing entity degrades to "no sync metadata" with a
//! warning instead of failing the whole file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::model::{
    Entity, EntityKind, Issue, Milestone, MilestoneState, Project, ProjectState, RemoteState,
    SyncMetadata,
};

const DELIMITER: &str = "---";

/// Raw issue frontmatter. Every field is optional so validation can
/// report which required field is missing instead of a generic decode
/// error; enums and timestamps stay strings for the same reason.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IssueHeader {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    milestone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_minutes: Option<i32>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sync_metadata: Option<serde_yaml::Value>,
}

/// Typed shape of the `sync_metadata` block, decoded leniently from the
/// raw value captured in the header.
#[derive(Debug, Serialize, Deserialize)]
struct SyncMetadataBlock {
    last_synced: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_state: Option<RemoteState>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MilestoneHeader {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectHeader {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

/// Split a file into its metadata block and body.
///
/// The body starts after the closing delimiter and one blank separator
/// line; everything beyond that is returned verbatim.
fn split_metadata(content: &str) -> std::result::Result<(&str, &str), ParseError> {
    let rest = content
        .strip_prefix("---\n")
        .ok_or(ParseError::MissingMetadata)?;

    let (header, after) = if let Some(idx) = rest.find("\n---\n") {
        (&rest[..idx], &rest[idx + 5..])
    } else if let Some(header) = rest.strip_suffix("\n---") {
        // Closing delimiter at EOF with no trailing newline: empty body.
        (header, "")
    } else if rest.starts_with("---\n") {
        // Empty metadata block.
        ("", &rest[4..])
    } else {
        return Err(ParseError::UnterminatedMetadata);
    };

    // One blank line separates metadata from body.
    let body = after.strip_prefix('\n').unwrap_or(after);
    Ok((header, body))
}

fn required<'a>(
    value: Option<&'a String>,
    field: &str,
) -> std::result::Result<&'a str, ParseError> {
    match value.map(String::as_str).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ParseError::missing(field)),
    }
}

fn parse_timestamp(value: &str, field: &str) -> std::result::Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ParseError::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Decode the raw `sync_metadata` value, degrading to `None` with a
/// warning on any defect. Advisory state must never fail the file.
fn decode_sync_metadata(raw: serde_yaml::Value, entity_id: &str) -> Option<SyncMetadata> {
    let block: SyncMetadataBlock = match serde_yaml::from_value(raw) {
        Ok(block) => block,
        Err(err) => {
            tracing::warn!("dropping undecodable sync_metadata for {entity_id}: {err}");
            return None;
        }
    };

    let last_synced = match DateTime::parse_from_rfc3339(&block.last_synced) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            tracing::warn!(
                "dropping sync_metadata for {entity_id}: bad last_synced '{}'",
                block.last_synced
            );
            return None;
        }
    };

    if let Some(ref remote) = block.remote_state {
        if remote.id != entity_id {
            tracing::warn!(
                "dropping sync_metadata for {entity_id}: remote_state id '{}' does not match",
                remote.id
            );
            return None;
        }
    }

    Some(SyncMetadata {
        last_synced,
        remote_state: block.remote_state,
    })
}

/// Parse an issue file.
///
/// # Errors
///
/// Returns a distinct [`ParseError`] for missing metadata, malformed
/// YAML, missing required fields, invalid enum values, and invalid
/// timestamps.
pub fn parse_issue(content: &str) -> std::result::Result<Issue, ParseError> {
    let (metadata, body) = split_metadata(content)?;
    let header: IssueHeader = serde_yaml::from_str(metadata)?;

    let id = required(header.id.as_ref(), "id")?.to_string();
    let title = required(header.title.as_ref(), "title")?.to_string();
    let status = required(header.status.as_ref(), "status")?.parse()?;
    let priority = required(header.priority.as_ref(), "priority")?.parse()?;
    let created = parse_timestamp(required(header.created.as_ref(), "created")?, "created")?;
    let updated = parse_timestamp(required(header.updated.as_ref(), "updated")?, "updated")?;

    let sync = header
        .sync_metadata
        .and_then(|raw| decode_sync_metadata(raw, &id));

    Ok(Issue {
        id,
        title,
        status,
        priority,
        assignee: header.assignee,
        milestone: header.milestone,
        summary: header.summary,
        labels: header.labels,
        estimated_minutes: header.estimated_minutes,
        created,
        updated,
        sync,
        body: body.to_string(),
    })
}

/// Parse a milestone file.
///
/// # Errors
///
/// Returns a [`ParseError`] on malformed metadata or missing fields.
pub fn parse_milestone(content: &str) -> std::result::Result<Milestone, ParseError> {
    let (metadata, body) = split_metadata(content)?;
    let header: MilestoneHeader = serde_yaml::from_str(metadata)?;

    let name = required(header.name.as_ref(), "name")?.to_string();
    let state = header
        .state
        .as_deref()
        .map_or(Ok(MilestoneState::Open), str::parse)?;
    let due = header
        .due
        .as_deref()
        .map(|v| parse_timestamp(v, "due"))
        .transpose()?;
    let created = parse_timestamp(required(header.created.as_ref(), "created")?, "created")?;
    let updated = parse_timestamp(required(header.updated.as_ref(), "updated")?, "updated")?;

    Ok(Milestone {
        name,
        state,
        due,
        created,
        updated,
        body: body.to_string(),
    })
}

/// Parse a project file.
///
/// # Errors
///
/// Returns a [`ParseError`] on malformed metadata or missing fields.
pub fn parse_project(content: &str) -> std::result::Result<Project, ParseError> {
    let (metadata, body) = split_metadata(content)?;
    let header: ProjectHeader = serde_yaml::from_str(metadata)?;

    let id = required(header.id.as_ref(), "id")?.to_string();
    let title = required(header.title.as_ref(), "title")?.to_string();
    let state = header
        .state
        .as_deref()
        .map_or(Ok(ProjectState::Active), str::parse)?;
    let created = parse_timestamp(required(header.created.as_ref(), "created")?, "created")?;
    let updated = parse_timestamp(required(header.updated.as_ref(), "updated")?, "updated")?;

    Ok(Project {
        id,
        title,
        state,
        created,
        updated,
        body: body.to_string(),
    })
}

/// Parse a file of the given kind.
///
/// # Errors
///
/// Returns a [`ParseError`] as the kind-specific parsers do.
pub fn parse_entity(kind: EntityKind, content: &str) -> std::result::Result<Entity, ParseError> {
    match kind {
        EntityKind::Issue => parse_issue(content).map(Entity::Issue),
        EntityKind::Milestone => parse_milestone(content).map(Entity::Milestone),
        EntityKind::Project => parse_project(content).map(Entity::Project),
    }
}

fn render(metadata_yaml: &str, body: &str) -> String {
    let mut out = String::with_capacity(metadata_yaml.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(metadata_yaml);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push('\n');
    out.push_str(body);
    out
}

/// Serialize an issue to its file representation.
///
/// # Errors
///
/// Returns an error if the metadata cannot be encoded as YAML.
pub fn serialize_issue(issue: &Issue) -> Result<String> {
    let sync_metadata = issue
        .sync
        .as_ref()
        .map(|sync| {
            serde_yaml::to_value(SyncMetadataBlock {
                last_synced: sync.last_synced.to_rfc3339(),
                remote_state: sync.remote_state.clone(),
            })
        })
        .transpose()?;

    let header = IssueHeader {
        id: Some(issue.id.clone()),
        title: Some(issue.title.clone()),
        status: Some(issue.status.as_str().to_string()),
        priority: Some(issue.priority.as_str().to_string()),
        assignee: issue.assignee.clone(),
        milestone: issue.milestone.clone(),
        summary: issue.summary.clone(),
        labels: issue.labels.clone(),
        estimated_minutes: issue.estimated_minutes,
        created: Some(issue.created.to_rfc3339()),
        updated: Some(issue.updated.to_rfc3339()),
        sync_metadata,
    };

    let yaml = serde_yaml::to_string(&header)?;
    Ok(render(&yaml, &issue.body))
}

/// Serialize a milestone to its file representation.
///
/// # Errors
///
/// Returns an error if the metadata cannot be encoded as YAML.
pub fn serialize_milestone(milestone: &Milestone) -> Result<String> {
    let header = MilestoneHeader {
        name: Some(milestone.name.clone()),
        state: Some(milestone.state.as_str().to_string()),
        due: milestone.due.map(|dt| dt.to_rfc3339()),
        created: Some(milestone.created.to_rfc3339()),
        updated: Some(milestone.updated.to_rfc3339()),
    };

    let yaml = serde_yaml::to_string(&header)?;
    Ok(render(&yaml, &milestone.body))
}

/// Serialize a project to its file representation.
///
/// # Errors
///
/// Returns an error if the metadata cannot be encoded as YAML.
pub fn serialize_project(project: &Project) -> Result<String> {
    let header = ProjectHeader {
        id: Some(project.id.clone()),
        title: Some(project.title.clone()),
        state: Some(project.state.as_str().to_string()),
        created: Some(project.created.to_rfc3339()),
        updated: Some(project.updated.to_rfc3339()),
    };

    let yaml = serde_yaml::to_string(&header)?;
    Ok(render(&yaml, &project.body))
}

/// Serialize any entity to its file representation.
///
/// # Errors
///
/// Returns an error if the metadata cannot be encoded as YAML.
pub fn serialize_entity(entity: &Entity) -> Result<String> {
    match entity {
        Entity::Issue(issue) => serialize_issue(issue),
        Entity::Milestone(milestone) => serialize_milestone(milestone),
        Entity::Project(project) => serialize_project(project),
    }
}
