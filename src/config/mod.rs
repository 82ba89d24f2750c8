//! Configuration for `docket`.
//!
//! Sources and precedence (highest wins):
//! 1. Environment variables (`DOCKET_DEFAULT_PRIORITY`)
//! 2. Project config (`.docket/config.yaml`)
//! 3. Defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DocketError, Result};
use crate::model::Priority;

/// Remote tracker coordinates, informational only: the API client lives
/// outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub provider: String,
    pub repository: String,
}

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Priority applied when `create` gets none.
    pub default_priority: Priority,
    /// How long the assignee directory stays fresh.
    pub assignee_cache_ttl_minutes: i64,
    /// Remote tracker this workspace reconciles against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_priority: Priority::Medium,
            assignee_cache_ttl_minutes: 10,
            remote: None,
        }
    }
}

impl Config {
    /// Load configuration from the workspace config file.
    ///
    /// A missing file yields defaults; a present but unreadable or
    /// malformed file is an error, since silently ignoring it would hide
    /// the user's intent.
    ///
    /// # Errors
    ///
    /// Returns a [`DocketError::Config`] on unreadable or malformed files.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.is_file() {
            let content = fs::read_to_string(path)
                .map_err(|e| DocketError::Config(format!("cannot read {}: {e}", path.display())))?;
            serde_yaml::from_str(&content)
                .map_err(|e| DocketError::Config(format!("invalid {}: {e}", path.display())))?
        } else {
            Self::default()
        };

        if let Ok(value) = std::env::var("DOCKET_DEFAULT_PRIORITY") {
            if !value.trim().is_empty() {
                config.default_priority = Priority::from_str(&value)
                    .map_err(|e| DocketError::Config(format!("DOCKET_DEFAULT_PRIORITY: {e}")))?;
            }
        }

        Ok(config)
    }

    /// TTL for the assignee directory as a chrono duration.
    #[must_use]
    pub fn assignee_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.assignee_cache_ttl_minutes.max(0))
    }
}
