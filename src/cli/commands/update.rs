use std::path::PathBuf;

use chrono::Utc;

use crate::cli::UpdateArgs;
use crate::cli::commands::create::index_saved_issue;
use crate::cli::commands::{App, parse_flag};
use crate::error::{DocketError, Result};
use crate::util::cache::AssigneeDirectory;
use crate::util::normalize_name;

/// Execute the update command.
///
/// Title and milestone changes move the file; the store guarantees a
/// single live copy of the id throughout.
///
/// # Errors
///
/// Returns an error when an id cannot be resolved, a value is invalid,
/// or a file cannot be rewritten.
pub fn execute(args: &UpdateArgs, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    app.refresh_index()?;

    let mut directory = AssigneeDirectory::new(app.config.assignee_cache_ttl());

    for partial in &args.ids {
        let (id, path) = app.index.resolve_issue(partial)?;
        let mut issue = app.workspace.load_issue(&path)?;

        if let Some(ref title) = args.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(DocketError::validation("title", "cannot be empty"));
            }
            issue.title = title.to_string();
        }
        if let Some(ref status) = args.status {
            issue.status = parse_flag(status, "status")?;
        }
        if let Some(ref priority) = args.priority {
            issue.priority = parse_flag(priority, "priority")?;
        }
        if let Some(ref assignee) = args.assignee {
            issue.assignee = if assignee.is_empty() {
                None
            } else {
                Some(directory.canonical(assignee, || {
                    app.index.assignees().unwrap_or_default()
                }))
            };
        }
        if let Some(ref milestone) = args.milestone {
            issue.milestone = if milestone.is_empty() {
                None
            } else {
                Some(normalize_name(milestone))
            };
        }
        if let Some(ref summary) = args.summary {
            issue.summary = if summary.is_empty() {
                None
            } else {
                Some(summary.clone())
            };
        }
        if !args.label.is_empty() {
            issue.labels.clone_from(&args.label);
        }
        if let Some(estimate) = args.estimate {
            issue.estimated_minutes = Some(estimate);
        }

        issue.updated = Utc::now();

        let new_path = app.workspace.save_issue(&issue, Some(&path))?;
        index_saved_issue(&mut app, &issue, &new_path)?;

        println!("Updated {id}");
    }

    Ok(())
}
