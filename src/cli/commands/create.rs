use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::cli::CreateArgs;
use crate::cli::commands::{App, parse_flag};
use crate::error::{DocketError, Result};
use crate::index::ListFilter;
use crate::model::{Entity, EntityKind, Issue};
use crate::util::cache::AssigneeDirectory;
use crate::util::{content_fingerprint, id, normalize_name};

/// Execute the create command.
///
/// # Errors
///
/// Returns an error on validation failures or filesystem/index errors.
pub fn execute(args: CreateArgs, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    app.refresh_index()?;

    let title = args.title.join(" ").trim().to_string();
    if title.is_empty() {
        return Err(DocketError::validation("title", "cannot be empty"));
    }
    if title.len() > 500 {
        return Err(DocketError::validation("title", "must be at most 500 chars"));
    }

    let now = Utc::now();
    let mut issue = Issue::new(new_issue_id(&app, &title)?, title, now);

    if let Some(ref priority) = args.priority {
        issue.priority = parse_flag(priority, "priority")?;
    } else {
        issue.priority = app.config.default_priority;
    }
    if let Some(ref assignee) = args.assignee {
        let mut directory = AssigneeDirectory::new(app.config.assignee_cache_ttl());
        issue.assignee = Some(directory.canonical(assignee, || {
            app.index.assignees().unwrap_or_default()
        }));
    }
    if let Some(ref milestone) = args.milestone {
        issue.milestone = Some(normalize_name(milestone));
    }
    issue.summary = args.summary;
    issue.labels = args.label;
    issue.estimated_minutes = args.estimate;
    issue.body = args.body.unwrap_or_default();

    let path = app.workspace.save_issue(&issue, None)?;
    index_saved_issue(&mut app, &issue, &path)?;

    println!("Created {}: {}", issue.id, issue.title);
    Ok(())
}

/// Generate a fresh id that collides with nothing in the index.
fn new_issue_id(app: &App, title: &str) -> Result<String> {
    let taken: HashSet<String> = app
        .index
        .list(&ListFilter {
            kind: Some(EntityKind::Issue),
            ..Default::default()
        })?
        .into_iter()
        .map(|record| record.id)
        .collect();

    Ok(id::generate(title, Utc::now(), |candidate| {
        taken.contains(candidate)
    }))
}

/// Upsert a just-written issue so the index stays warm.
pub(crate) fn index_saved_issue(
    app: &mut App,
    issue: &Issue,
    path: &std::path::Path,
) -> Result<()> {
    let bytes = fs::read(path)?;
    let fingerprint = content_fingerprint(&bytes);
    app.index
        .upsert(&Entity::Issue(issue.clone()), path, &fingerprint)
}
