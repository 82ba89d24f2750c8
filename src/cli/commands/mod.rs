//! Command implementations.

pub mod close;
pub mod create;
pub mod init;
pub mod list;
pub mod milestone;
pub mod project;
pub mod reindex;
pub mod show;
pub mod sync;
pub mod update;

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{DocketError, ParseError, Result};
use crate::index::Index;
use crate::store::Workspace;

/// Everything a command needs: the workspace, its config, and the query
/// index.
pub struct App {
    pub workspace: Workspace,
    pub config: Config,
    pub index: Index,
}

impl App {
    /// Open the workspace (explicit dir or discovery) and its index.
    ///
    /// # Errors
    ///
    /// Returns an error when no workspace exists or the index cannot open.
    pub fn load(dir: Option<&PathBuf>) -> Result<Self> {
        let workspace = match dir {
            Some(dir) => Workspace::open(dir.clone())?,
            None => Workspace::discover(None)?,
        };
        let config = Config::load(&workspace.config_path())?;
        let index = Index::open(&workspace.index_path())?;
        Ok(Self {
            workspace,
            config,
            index,
        })
    }

    /// Let the change detector bring the index up to date. Returns the
    /// number of files skipped for parse errors.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem or database failures.
    pub fn refresh_index(&mut self) -> Result<usize> {
        let report = self.index.refresh(&self.workspace, false)?;
        for (path, err) in &report.skipped {
            tracing::warn!("skipped {}: {err}", path.display());
        }
        Ok(report.skipped.len())
    }
}

/// Parse a CLI flag value through the model's `FromStr`, reporting the
/// flag name on failure.
pub fn parse_flag<T>(value: &str, field: &str) -> Result<T>
where
    T: FromStr<Err = ParseError>,
{
    T::from_str(value).map_err(|err| DocketError::validation(field, err.to_string()))
}
