//! docket — plain-text issue tracking with an incremental query index
//! and three-way sync reconciliation.
//!
//! Issues, milestones, and projects live as human-editable files (YAML
//! metadata block plus Markdown body) inside the repository. A derived
//! SQLite index keeps listings fast and is rebuilt incrementally from
//! content fingerprints. Reconciliation against an external tracker is
//! three-way: current file vs. the file at `last_synced` (from git
//! history) vs. the embedded snapshot of the remote at `last_synced`.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod history;
pub mod index;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod util;

pub use error::{DocketError, HistoryError, ParseError, Result};
