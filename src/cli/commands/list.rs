use std::path::PathBuf;

use crate::cli::ListArgs;
use crate::cli::commands::{App, parse_flag};
use crate::error::{DocketError, Result};
use crate::index::{IndexRecord, ListFilter};
use crate::model::{EntityKind, Status};

/// Execute the list command.
///
/// Partial failures (files the codec rejects) are reported as a warning
/// count; the listing itself still succeeds.
///
/// # Errors
///
/// Returns an error on index or filesystem failures.
pub fn execute(args: &ListArgs, json: bool, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    let skipped = app.refresh_index()?;

    let kind = match args.kind.to_lowercase().as_str() {
        "issue" | "issues" => EntityKind::Issue,
        "milestone" | "milestones" => EntityKind::Milestone,
        "project" | "projects" => EntityKind::Project,
        other => {
            return Err(DocketError::validation(
                "kind",
                format!("unknown kind '{other}'"),
            ));
        }
    };

    // Normalize status input for issues so `in_progress` matches files
    // that store `in-progress`.
    let status = match (kind, args.status.as_deref()) {
        (_, None) => None,
        (EntityKind::Issue, Some(raw)) => {
            Some(parse_flag::<Status>(raw, "status")?.as_str().to_string())
        }
        (_, Some(raw)) => Some(raw.to_lowercase()),
    };

    let filter = ListFilter {
        kind: Some(kind),
        status,
        assignee: args.assignee.clone(),
        milestone: args.milestone.clone(),
        label: args.label.clone(),
    };
    let records = app.index.list(&filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        render_text(&records, kind);
    }

    if skipped > 0 {
        eprintln!("warning: {skipped} file(s) skipped (run with -v for details)");
    }
    Ok(())
}

fn render_text(records: &[IndexRecord], kind: EntityKind) {
    if records.is_empty() {
        println!("No {}s found", kind.as_str());
        return;
    }

    for record in records {
        match kind {
            EntityKind::Issue => {
                let assignee = record.assignee.as_deref().unwrap_or("-");
                let milestone = record.milestone.as_deref().unwrap_or("backlog");
                println!(
                    "{}  {:<11}  {:<8}  {:<12}  {:<12}  {}",
                    record.id,
                    record.status,
                    record.priority.as_deref().unwrap_or("-"),
                    assignee,
                    milestone,
                    record.title,
                );
            }
            EntityKind::Milestone | EntityKind::Project => {
                println!("{}  {:<8}  {}", record.id, record.status, record.title);
            }
        }
    }
}
