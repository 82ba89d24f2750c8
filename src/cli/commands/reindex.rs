use std::path::PathBuf;

use crate::cli::commands::App;
use crate::error::Result;

/// Execute the reindex command.
///
/// The index is derived state; this re-parses changed files (or all of
/// them with `--force`) and prunes rows for deleted files. Files the
/// codec rejects are reported and skipped, and the command still exits
/// successfully.
///
/// # Errors
///
/// Returns an error on filesystem or database failures.
pub fn execute(force: bool, dir: Option<&PathBuf>) -> Result<()> {
    let mut app = App::load(dir)?;
    let report = app.index.refresh(&app.workspace, force)?;

    println!(
        "Indexed {} file(s), removed {} row(s), skipped {}",
        report.indexed,
        report.removed,
        report.skipped.len()
    );
    for (path, err) in &report.skipped {
        eprintln!("  skipped {}: {err}", path.display());
    }
    Ok(())
}
