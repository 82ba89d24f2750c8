use std::path::PathBuf;

use crate::error::Result;
use crate::index::Index;
use crate::store::Workspace;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the workspace or index cannot be created.
pub fn execute(path: Option<PathBuf>, force: bool) -> Result<()> {
    let base = path.unwrap_or_else(|| PathBuf::from("."));
    let workspace = Workspace::init(&base, force)?;

    let mut index = Index::open(&workspace.index_path())?;
    index.refresh(&workspace, true)?;

    println!("Initialized docket workspace in {}", workspace.root().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocketError;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_workspace_and_index() {
        let temp = TempDir::new().unwrap();
        execute(Some(temp.path().to_path_buf()), false).unwrap();

        let root = temp.path().join(".docket");
        assert!(root.is_dir());
        assert!(root.join("cache/index.db").is_file());
        assert!(root.join("issues/backlog").is_dir());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp = TempDir::new().unwrap();
        execute(Some(temp.path().to_path_buf()), false).unwrap();

        let err = execute(Some(temp.path().to_path_buf()), false).unwrap_err();
        assert!(matches!(err, DocketError::AlreadyInitialized { .. }));
    }

    #[test]
    fn test_init_force_reinitializes() {
        let temp = TempDir::new().unwrap();
        execute(Some(temp.path().to_path_buf()), false).unwrap();
        execute(Some(temp.path().to_path_buf()), true).unwrap();
    }
}
