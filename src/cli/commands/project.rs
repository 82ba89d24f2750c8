use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::cli::ProjectCommands;
use crate::cli::commands::App;
use crate::error::{DocketError, Result};
use crate::index::ListFilter;
use crate::model::{Entity, EntityKind, Project, ProjectState};
use crate::util::{content_fingerprint, id};

/// Execute a project subcommand.
///
/// # Errors
///
/// Returns an error on validation, filesystem, or index failures.
pub fn execute(command: &ProjectCommands, json: bool, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    app.refresh_index()?;

    match command {
        ProjectCommands::Add { title } => add(&mut app, &title.join(" ")),
        ProjectCommands::List => list(&app, json),
    }
}

fn add(app: &mut App, title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DocketError::validation("title", "cannot be empty"));
    }

    let taken: HashSet<String> = app
        .index
        .list(&ListFilter {
            kind: Some(EntityKind::Project),
            ..Default::default()
        })?
        .into_iter()
        .map(|record| record.id)
        .collect();

    let now = Utc::now();
    let project = Project {
        id: id::generate(title, now, |candidate| taken.contains(candidate)),
        title: title.to_string(),
        state: ProjectState::Active,
        created: now,
        updated: now,
        body: String::new(),
    };

    let path = app.workspace.save_project(&project, None)?;
    let bytes = fs::read(&path)?;
    app.index.upsert(
        &Entity::Project(project.clone()),
        &path,
        &content_fingerprint(&bytes),
    )?;

    println!("Created project {}: {}", project.id, project.title);
    Ok(())
}

fn list(app: &App, json: bool) -> Result<()> {
    let records = app.index.list(&ListFilter {
        kind: Some(EntityKind::Project),
        ..Default::default()
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No projects found");
    } else {
        for record in records {
            println!("{}  {:<8}  {}", record.id, record.status, record.title);
        }
    }
    Ok(())
}
