//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Plain-text issue tracker with an incremental index and sync reconciliation
#[derive(Parser, Debug)]
#[command(name = "dk", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory (auto-discover .docket/ if not set)
    #[arg(long, global = true, env = "DOCKET_DIR")]
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a docket workspace
    Init {
        /// Directory to initialize under (default: current directory)
        path: Option<PathBuf>,

        /// Overwrite an existing workspace
        #[arg(long)]
        force: bool,
    },

    /// Create a new issue
    Create(CreateArgs),

    /// List entities
    List(ListArgs),

    /// Show issue details
    Show {
        /// Issue IDs (prefixes accepted)
        ids: Vec<String>,
    },

    /// Update one or more issues
    Update(UpdateArgs),

    /// Close an issue (status = done)
    Close {
        /// Issue IDs (prefixes accepted)
        ids: Vec<String>,
    },

    /// Manage milestones
    Milestone {
        #[command(subcommand)]
        command: MilestoneCommands,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Rebuild the query index from the entity files
    Reindex {
        /// Re-parse every file instead of only changed ones
        #[arg(long)]
        force: bool,
    },

    /// Classify local vs. remote changes since the last sync
    Sync(SyncArgs),
}

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Issue title
    #[arg(required = true)]
    pub title: Vec<String>,

    /// Priority (critical, high, medium, low)
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Assignee
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// Milestone name (default: backlog)
    #[arg(long, short = 'm')]
    pub milestone: Option<String>,

    /// One-line summary
    #[arg(long)]
    pub summary: Option<String>,

    /// Labels (repeatable)
    #[arg(long, short = 'l')]
    pub label: Vec<String>,

    /// Estimated effort in minutes
    #[arg(long)]
    pub estimate: Option<i32>,

    /// Issue body
    #[arg(long)]
    pub body: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Entity kind (issue, milestone, project)
    #[arg(long, default_value = "issue")]
    pub kind: String,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by assignee
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// Filter by milestone
    #[arg(long, short = 'm')]
    pub milestone: Option<String>,

    /// Filter by label
    #[arg(long, short = 'l')]
    pub label: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Issue IDs (prefixes accepted)
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// New title (moves the file)
    #[arg(long)]
    pub title: Option<String>,

    /// New status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// New priority
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// New assignee (empty string clears)
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// New milestone (empty string moves back to backlog)
    #[arg(long, short = 'm')]
    pub milestone: Option<String>,

    /// New one-line summary (empty string clears)
    #[arg(long)]
    pub summary: Option<String>,

    /// Replace the label set (repeatable)
    #[arg(long, short = 'l')]
    pub label: Vec<String>,

    /// New estimate in minutes
    #[arg(long)]
    pub estimate: Option<i32>,
}

#[derive(Subcommand, Debug)]
pub enum MilestoneCommands {
    /// Create a milestone
    Add {
        /// Milestone name (normalized to lowercase-dashed form)
        name: String,

        /// Due date (RFC3339, YYYY-MM-DD, +2d, tomorrow)
        #[arg(long)]
        due: Option<String>,
    },

    /// List milestones
    List,

    /// Close a milestone
    Close {
        /// Milestone name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project
    Add {
        /// Project title
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// List projects
    List,
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Limit to these issue IDs (prefixes accepted; default: all)
    pub ids: Vec<String>,

    /// Record a successful sync: set last_synced to now and freeze the
    /// current state as the remote snapshot
    #[arg(long)]
    pub mark: bool,
}
