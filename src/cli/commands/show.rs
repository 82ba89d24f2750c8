use std::path::PathBuf;

use crate::cli::commands::App;
use crate::error::{DocketError, Result};
use crate::model::Issue;

/// Execute the show command.
///
/// Unlike listings, a direct lookup fails loudly when the file is
/// corrupt: the user asked for this specific issue.
///
/// # Errors
///
/// Returns an error when an id cannot be resolved or its file is corrupt.
pub fn execute(ids: &[String], json: bool, dir: Option<&PathBuf>) -> Result<()> {
    if ids.is_empty() {
        return Err(DocketError::validation("ids", "at least one id required"));
    }

    let mut app = App::load(dir)?;
    app.refresh_index()?;

    let mut issues = Vec::new();
    for partial in ids {
        let (_, path) = app.index.resolve_issue(partial)?;
        issues.push(app.workspace.load_issue(&path)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else {
        for (n, issue) in issues.iter().enumerate() {
            if n > 0 {
                println!();
            }
            render_text(issue);
        }
    }
    Ok(())
}

fn render_text(issue: &Issue) {
    println!("{}  {}", issue.id, issue.title);
    println!("  status:    {}", issue.status);
    println!("  priority:  {}", issue.priority);
    if let Some(ref assignee) = issue.assignee {
        println!("  assignee:  {assignee}");
    }
    println!("  milestone: {}", issue.group());
    if let Some(ref summary) = issue.summary {
        println!("  summary:   {summary}");
    }
    if !issue.labels.is_empty() {
        println!("  labels:    {}", issue.labels.join(", "));
    }
    if let Some(minutes) = issue.estimated_minutes {
        println!("  estimate:  {minutes}m");
    }
    println!("  created:   {}", issue.created.to_rfc3339());
    println!("  updated:   {}", issue.updated.to_rfc3339());
    if let Some(ref sync) = issue.sync {
        println!("  last sync: {}", sync.last_synced.to_rfc3339());
    }
    if !issue.body.trim().is_empty() {
        println!();
        println!("{}", issue.body.trim_end());
    }
}
