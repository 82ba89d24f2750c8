use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::cli::MilestoneCommands;
use crate::cli::commands::App;
use crate::error::{DocketError, Result};
use crate::index::ListFilter;
use crate::model::{Entity, EntityKind, Milestone, MilestoneState};
use crate::util::time::parse_flexible_timestamp;
use crate::util::{content_fingerprint, normalize_name};

/// Execute a milestone subcommand.
///
/// # Errors
///
/// Returns an error on validation, filesystem, or index failures.
pub fn execute(command: &MilestoneCommands, json: bool, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    app.refresh_index()?;

    match command {
        MilestoneCommands::Add { name, due } => add(&mut app, name, due.as_deref()),
        MilestoneCommands::List => list(&app, json),
        MilestoneCommands::Close { name } => close(&mut app, name),
    }
}

fn add(app: &mut App, name: &str, due: Option<&str>) -> Result<()> {
    let name = normalize_name(name);
    let now = Utc::now();

    let milestone = Milestone {
        name: name.clone(),
        state: MilestoneState::Open,
        due: due.map(|d| parse_flexible_timestamp(d, "due")).transpose()?,
        created: now,
        updated: now,
        body: String::new(),
    };

    if app.workspace.milestone_path(&milestone).exists() {
        return Err(DocketError::IdCollision { id: name });
    }

    let path = app.workspace.save_milestone(&milestone, None)?;
    upsert_milestone(app, &milestone, &path)?;

    println!("Created milestone {name}");
    Ok(())
}

fn list(app: &App, json: bool) -> Result<()> {
    let records = app.index.list(&ListFilter {
        kind: Some(EntityKind::Milestone),
        ..Default::default()
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No milestones found");
    } else {
        for record in records {
            println!("{}  {}", record.id, record.status);
        }
    }
    Ok(())
}

fn close(app: &mut App, name: &str) -> Result<()> {
    let name = normalize_name(name);
    let probe = Milestone {
        name: name.clone(),
        state: MilestoneState::Open,
        due: None,
        created: Utc::now(),
        updated: Utc::now(),
        body: String::new(),
    };
    let path = app.workspace.milestone_path(&probe);
    if !path.exists() {
        return Err(DocketError::MilestoneNotFound { name });
    }

    let mut milestone = app.workspace.load_milestone(&path)?;
    milestone.state = MilestoneState::Closed;
    milestone.updated = Utc::now();

    let path = app.workspace.save_milestone(&milestone, Some(&path))?;
    upsert_milestone(app, &milestone, &path)?;

    println!("Closed milestone {name}");
    Ok(())
}

fn upsert_milestone(app: &mut App, milestone: &Milestone, path: &std::path::Path) -> Result<()> {
    let bytes = fs::read(path)?;
    let fingerprint = content_fingerprint(&bytes);
    app.index
        .upsert(&Entity::Milestone(milestone.clone()), path, &fingerprint)
}
