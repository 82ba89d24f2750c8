use std::path::PathBuf;

use chrono::Utc;

use crate::cli::commands::App;
use crate::cli::commands::create::index_saved_issue;
use crate::error::{DocketError, Result};
use crate::model::Status;

/// Execute the close command: set status to done.
///
/// # Errors
///
/// Returns an error when an id cannot be resolved or its file rewritten.
pub fn execute(ids: &[String], dir: Option<&PathBuf>) -> Result<()> {
    if ids.is_empty() {
        return Err(DocketError::validation("ids", "at least one id required"));
    }

    let mut app = App::load(dir)?;
    app.refresh_index()?;

    for partial in ids {
        let (id, path) = app.index.resolve_issue(partial)?;
        let mut issue = app.workspace.load_issue(&path)?;

        if issue.status == Status::Done {
            println!("{id} already done");
            continue;
        }

        issue.status = Status::Done;
        issue.updated = Utc::now();

        let new_path = app.workspace.save_issue(&issue, Some(&path))?;
        index_saved_issue(&mut app, &issue, &new_path)?;

        println!("Closed {id}");
    }

    Ok(())
}
