use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::cli::SyncArgs;
use crate::cli::commands::App;
use crate::error::{DocketError, Result};
use crate::history::GitHistory;
use crate::index::ListFilter;
use crate::model::{EntityKind, RemoteState, SyncMetadata};
use crate::reconcile::{self, Classification, EntityReport};

#[derive(Debug, Serialize)]
struct SyncSummary {
    issues: usize,
    push: usize,
    pull: usize,
    conflicts: usize,
    settled: usize,
    skipped: usize,
    marked: usize,
}

/// Execute the sync command.
///
/// Loads the three baselines per issue and prints the per-field
/// classification. Applying pushes/pulls belongs to an external
/// collaborator; `--mark` records the anchor that collaborator would
/// hand back after a successful pass.
///
/// # Errors
///
/// Returns an error on history access failures (never silently treated
/// as "no baseline"), on unresolvable explicit ids, and on corrupt files
/// when named explicitly.
pub fn execute(args: &SyncArgs, json: bool, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    app.refresh_index()?;

    let history = GitHistory::new(app.workspace.repo_root());
    let explicit = !args.ids.is_empty();

    let targets: Vec<(String, PathBuf)> = if explicit {
        args.ids
            .iter()
            .map(|partial| app.index.resolve_issue(partial))
            .collect::<Result<_>>()?
    } else {
        app.index
            .list(&ListFilter {
                kind: Some(EntityKind::Issue),
                ..Default::default()
            })?
            .into_iter()
            .map(|record| (record.id, PathBuf::from(record.path)))
            .collect()
    };

    let mut summary = SyncSummary {
        issues: 0,
        push: 0,
        pull: 0,
        conflicts: 0,
        settled: 0,
        skipped: 0,
        marked: 0,
    };
    let mut reports: Vec<EntityReport> = Vec::new();

    for (id, path) in targets {
        let issue = match app.workspace.load_issue(&path) {
            Ok(issue) => issue,
            Err(err @ DocketError::EntityParse { .. }) if !explicit => {
                tracing::warn!("sync skip {id}: {err}");
                summary.skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        let set = reconcile::load_baselines(&history, &path, &issue)?;
        let report = reconcile::reconcile(&set);

        summary.issues += 1;
        summary.push += report.push_candidates().len();
        summary.pull += report.pull_candidates().len();
        summary.conflicts += report.conflicts().len();
        if report.is_settled() {
            summary.settled += 1;
        }

        if args.mark {
            let sync = SyncMetadata {
                last_synced: Utc::now(),
                remote_state: Some(RemoteState::from(&issue)),
            };
            let new_path = app.workspace.write_sync_metadata(&path, Some(sync))?;
            let marked = app.workspace.load_issue(&new_path)?;
            crate::cli::commands::create::index_saved_issue(&mut app, &marked, &new_path)?;
            summary.marked += 1;
        }

        reports.push(report);
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "summary": summary,
                "reports": reports,
            }))?
        );
    } else {
        render_text(&reports, &summary, args.mark);
    }

    Ok(())
}

fn render_text(reports: &[EntityReport], summary: &SyncSummary, marked: bool) {
    for report in reports {
        if report.is_settled() {
            continue;
        }
        println!("{}", report.id);
        for delta in &report.deltas {
            if delta.classification == Classification::Unchanged {
                continue;
            }
            println!(
                "  {:<9} {:<11}  local: {}  remote: {}",
                delta.field, delta.classification, delta.local, delta.remote
            );
        }
    }

    println!(
        "{} issue(s): {} push, {} pull, {} conflict(s), {} settled, {} skipped",
        summary.issues,
        summary.push,
        summary.pull,
        summary.conflicts,
        summary.settled,
        summary.skipped
    );
    if marked {
        println!("Marked {} issue(s) as synced", summary.marked);
    }
}
