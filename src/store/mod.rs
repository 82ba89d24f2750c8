//! File-backed entity store.
//!
//! One file is the canonical representation of one entity. Layout under
//! the workspace directory:
//!
//! ```text
//! .docket/
//!   config.yaml
//!   cache/index.db          (derived, never committed)
//!   issues/<group>/<slug>-<id>.md
//!   milestones/<slug>.md
//!   projects/<slug>-<id>.md
//! ```
//!
//! Filenames derive deterministically from the normalized title plus id,
//! so renaming a title moves the file. All writes go through
//! write-temp-then-rename; moves rewrite in place and then rename the
//! file, so no two paths ever hold live copies of the same id.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::codec;
use crate::error::{DocketError, ParseError, Result};
use crate::model::{Entity, EntityKind, Issue, Milestone, Project, SyncMetadata};
use crate::util::slugify;

/// Workspace directory name, discovered by walking up from the CWD.
pub const WORKSPACE_DIR: &str = ".docket";

/// Environment override for the workspace directory.
pub const WORKSPACE_ENV: &str = "DOCKET_DIR";

const GITIGNORE_SEED: &str = "# Derived query index\ncache/\n\n# Lock files\n*.lock\n\n# Temporary\n*.tmp\n";

const CONFIG_SEED: &str = "# Docket project configuration\n# default_priority: medium\n# assignee_cache_ttl_minutes: 10\n";

/// One entity file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFile {
    pub kind: EntityKind,
    pub path: PathBuf,
}

/// A docket workspace rooted at its `.docket` directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open an existing workspace directory.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::NotInitialized`] if the directory is missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DocketError::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Discover the workspace: `DOCKET_DIR` if set, otherwise walk up
    /// from `start` (or the CWD) looking for a `.docket` directory.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::NotInitialized`] when nothing is found.
    pub fn discover(start: Option<&Path>) -> Result<Self> {
        if let Ok(dir) = std::env::var(WORKSPACE_ENV) {
            if !dir.trim().is_empty() {
                return Self::open(PathBuf::from(dir));
            }
        }

        let start = match start {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };

        let mut cursor = Some(start.as_path());
        while let Some(dir) = cursor {
            let candidate = dir.join(WORKSPACE_DIR);
            if candidate.is_dir() {
                return Ok(Self { root: candidate });
            }
            cursor = dir.parent();
        }

        Err(DocketError::NotInitialized)
    }

    /// Initialize a new workspace under `base`.
    ///
    /// Guards against concurrent initializers with an advisory lock file;
    /// a failed acquisition degrades to a warning and continues.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::AlreadyInitialized`] unless `force` is set,
    /// or an I/O error if directories cannot be created.
    pub fn init(base: &Path, force: bool) -> Result<Self> {
        let root = base.join(WORKSPACE_DIR);
        if root.is_dir() && !force {
            return Err(DocketError::AlreadyInitialized { path: root });
        }

        fs::create_dir_all(base)?;
        let _lock = InitLock::acquire(base);

        for dir in [
            root.clone(),
            root.join("cache"),
            root.join(EntityKind::Issue.dir_name()).join("backlog"),
            root.join(EntityKind::Milestone.dir_name()),
            root.join(EntityKind::Project.dir_name()),
        ] {
            fs::create_dir_all(&dir)?;
        }

        let gitignore = root.join(".gitignore");
        if !gitignore.exists() {
            fs::write(&gitignore, GITIGNORE_SEED)?;
        }

        let config = root.join("config.yaml");
        if !config.exists() {
            fs::write(&config, CONFIG_SEED)?;
        }

        Ok(Self { root })
    }

    /// The `.docket` directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory containing the workspace, i.e. the repository root.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        self.root.parent().unwrap_or(&self.root)
    }

    /// Path of the derived query index database.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join("cache").join("index.db")
    }

    /// Path of the workspace config file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    /// Canonical path for an issue given its current fields.
    #[must_use]
    pub fn issue_path(&self, issue: &Issue) -> PathBuf {
        let filename = format!("{}-{}.md", slugify(&issue.title), issue.id);
        self.root
            .join(EntityKind::Issue.dir_name())
            .join(issue.group())
            .join(filename)
    }

    /// Canonical path for a milestone.
    #[must_use]
    pub fn milestone_path(&self, milestone: &Milestone) -> PathBuf {
        self.root
            .join(EntityKind::Milestone.dir_name())
            .join(format!("{}.md", milestone.name))
    }

    /// Canonical path for a project.
    #[must_use]
    pub fn project_path(&self, project: &Project) -> PathBuf {
        let filename = format!("{}-{}.md", slugify(&project.title), project.id);
        self.root
            .join(EntityKind::Project.dir_name())
            .join(filename)
    }

    /// All entity files currently on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be read.
    pub fn scan(&self) -> Result<Vec<EntityFile>> {
        let mut files = Vec::new();

        let issues_root = self.root.join(EntityKind::Issue.dir_name());
        if issues_root.is_dir() {
            for group in fs::read_dir(&issues_root)? {
                let group = group?.path();
                if group.is_dir() {
                    collect_md(&group, EntityKind::Issue, &mut files)?;
                }
            }
        }

        for kind in [EntityKind::Milestone, EntityKind::Project] {
            let dir = self.root.join(kind.dir_name());
            if dir.is_dir() {
                collect_md(&dir, kind, &mut files)?;
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Parse one entity file, surfacing the typed parse error.
    ///
    /// # Errors
    ///
    /// Returns the I/O error on unreadable files and the codec's
    /// [`ParseError`] otherwise; bulk callers skip the latter per file.
    pub fn try_load(&self, file: &EntityFile) -> Result<std::result::Result<Entity, ParseError>> {
        let content = fs::read_to_string(&file.path)?;
        Ok(codec::parse_entity(file.kind, &content))
    }

    /// Load one issue file, failing loudly on parse errors.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::EntityParse`] when the file is corrupt.
    pub fn load_issue(&self, path: &Path) -> Result<Issue> {
        let content = fs::read_to_string(path)?;
        codec::parse_issue(&content).map_err(|source| DocketError::EntityParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load one milestone file, failing loudly on parse errors.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::EntityParse`] when the file is corrupt.
    pub fn load_milestone(&self, path: &Path) -> Result<Milestone> {
        let content = fs::read_to_string(path)?;
        codec::parse_milestone(&content).map_err(|source| DocketError::EntityParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load one project file, failing loudly on parse errors.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::EntityParse`] when the file is corrupt.
    pub fn load_project(&self, path: &Path) -> Result<Project> {
        let content = fs::read_to_string(path)?;
        codec::parse_project(&content).map_err(|source| DocketError::EntityParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// List all issues, aggregating parse failures instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns an error only on directory-level I/O failures.
    pub fn list_issues(&self) -> Result<(Vec<Issue>, Vec<(PathBuf, ParseError)>)> {
        let mut issues = Vec::new();
        let mut failures = Vec::new();

        for file in self.scan()? {
            if file.kind != EntityKind::Issue {
                continue;
            }
            match self.try_load(&file)? {
                Ok(Entity::Issue(issue)) => issues.push(issue),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!("skipping {}: {err}", file.path.display());
                    failures.push((file.path, err));
                }
            }
        }

        Ok((issues, failures))
    }

    /// Write an issue to its canonical path.
    ///
    /// When `previous_path` names a different location (title rename or
    /// regrouping), the updated content is first written in place and the
    /// file is then renamed, so exactly one live copy of the id exists at
    /// every instant.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save_issue(&self, issue: &Issue, previous_path: Option<&Path>) -> Result<PathBuf> {
        let new_path = self.issue_path(issue);
        let content = codec::serialize_issue(issue)?;
        self.place(&new_path, previous_path, content.as_bytes())?;
        Ok(new_path)
    }

    /// Write a milestone to its canonical path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save_milestone(
        &self,
        milestone: &Milestone,
        previous_path: Option<&Path>,
    ) -> Result<PathBuf> {
        let new_path = self.milestone_path(milestone);
        let content = codec::serialize_milestone(milestone)?;
        self.place(&new_path, previous_path, content.as_bytes())?;
        Ok(new_path)
    }

    /// Write a project to its canonical path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save_project(&self, project: &Project, previous_path: Option<&Path>) -> Result<PathBuf> {
        let new_path = self.project_path(project);
        let content = codec::serialize_project(project)?;
        self.place(&new_path, previous_path, content.as_bytes())?;
        Ok(new_path)
    }

    /// Replace the embedded sync metadata of the issue at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or written.
    pub fn write_sync_metadata(
        &self,
        path: &Path,
        sync: Option<SyncMetadata>,
    ) -> Result<PathBuf> {
        let mut issue = self.load_issue(path)?;
        issue.sync = sync;
        self.save_issue(&issue, Some(path))
    }

    fn place(&self, new_path: &Path, previous_path: Option<&Path>, content: &[u8]) -> Result<()> {
        if let Some(parent) = new_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match previous_path {
            Some(old) if old != new_path && old.exists() => {
                atomic_write(old, content)?;
                fs::rename(old, new_path)?;
            }
            _ => atomic_write(new_path, content)?,
        }
        Ok(())
    }
}

fn collect_md(dir: &Path, kind: EntityKind, out: &mut Vec<EntityFile>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_md = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if is_md {
            out.push(EntityFile { kind, path });
        }
    }
    Ok(())
}

/// Write a file so a concurrent reader never observes it half-written:
/// write to a sibling `.tmp`, then rename over the target.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("md.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

/// Advisory lock guarding first-time workspace initialization.
///
/// The lock file records the acquiring pid and timestamp. A pre-existing
/// lock degrades to a warning rather than a hard stop, since lockfile
/// corruption is likelier than a genuine concurrent initializer.
#[derive(Debug)]
pub struct InitLock {
    path: PathBuf,
    owned: bool,
}

impl InitLock {
    /// Try to acquire the lock under `base`.
    pub fn acquire(base: &Path) -> Self {
        let path = base.join(".docket-init.lock");
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let body = format!(
                    "pid: {}\nacquired: {}\n",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                if let Err(err) = file.write_all(body.as_bytes()) {
                    tracing::warn!("could not record init lock holder: {err}");
                }
                Self { path, owned: true }
            }
            Err(_) => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                tracing::warn!(
                    "init lock already held ({}); continuing best-effort",
                    holder.split_whitespace().collect::<Vec<_>>().join(" ")
                );
                Self { path, owned: false }
            }
        }
    }

    /// True when this process created the lock file.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.owned
    }
}

impl Drop for InitLock {
    fn drop(&mut self) {
        if self.owned {
            if let Err(err) = fs::remove_file(&self.path) {
                tracing::warn!("could not remove init lock: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use chrono::TimeZone;
    use chrono::{DateTime, Utc};
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000, 0).unwrap()
    }

    fn workspace() -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::init(temp.path(), false).unwrap();
        (temp, ws)
    }

    #[test]
    fn init_creates_layout() {
        let (_temp, ws) = workspace();
        assert!(ws.root().join("issues/backlog").is_dir());
        assert!(ws.root().join("milestones").is_dir());
        assert!(ws.root().join("projects").is_dir());
        assert!(ws.root().join("cache").is_dir());
        assert!(ws.root().join(".gitignore").is_file());
        assert!(ws.root().join("config.yaml").is_file());
    }

    #[test]
    fn init_twice_requires_force() {
        let (temp, _ws) = workspace();
        let err = Workspace::init(temp.path(), false).unwrap_err();
        assert!(matches!(err, DocketError::AlreadyInitialized { .. }));
        assert!(Workspace::init(temp.path(), true).is_ok());
    }

    #[test]
    fn init_removes_its_lock() {
        let (temp, _ws) = workspace();
        assert!(!temp.path().join(".docket-init.lock").exists());
    }

    #[test]
    fn stale_lock_degrades_to_warning() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".docket-init.lock"), "pid: 1\n").unwrap();

        // Init still succeeds; the stale lock is left for its owner.
        let ws = Workspace::init(temp.path(), false).unwrap();
        assert!(ws.root().is_dir());
        assert!(temp.path().join(".docket-init.lock").exists());
    }

    #[test]
    fn discover_walks_up() {
        let (temp, _ws) = workspace();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = Workspace::discover(Some(&nested)).unwrap();
        assert_eq!(found.root(), temp.path().join(WORKSPACE_DIR));
    }

    #[test]
    fn discover_missing_is_not_initialized() {
        let temp = TempDir::new().unwrap();
        let err = Workspace::discover(Some(temp.path())).unwrap_err();
        assert!(matches!(err, DocketError::NotInitialized));
    }

    #[test]
    fn issue_path_is_deterministic() {
        let (_temp, ws) = workspace();
        let issue = Issue::new("a1b2c3d4", "Fix login crash", t0());
        let path = ws.issue_path(&issue);
        assert!(path.ends_with("issues/backlog/fix-login-crash-a1b2c3d4.md"));
        assert_eq!(path, ws.issue_path(&issue));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (_temp, ws) = workspace();
        let mut issue = Issue::new("a1b2c3d4", "Fix login crash", t0());
        issue.status = Status::InProgress;
        issue.body = "details\n".to_string();

        let path = ws.save_issue(&issue, None).unwrap();
        let loaded = ws.load_issue(&path).unwrap();
        assert_eq!(loaded, issue);
    }

    #[test]
    fn regrouping_moves_the_file() {
        let (_temp, ws) = workspace();
        let mut issue = Issue::new("a1b2c3d4", "Fix login crash", t0());
        let old_path = ws.save_issue(&issue, None).unwrap();
        assert!(old_path.exists());

        issue.milestone = Some("v1".to_string());
        let new_path = ws.save_issue(&issue, Some(&old_path)).unwrap();

        assert!(!old_path.exists(), "old path must be gone");
        assert!(new_path.exists());
        assert!(new_path.to_string_lossy().contains("/v1/"));

        let moved = ws.load_issue(&new_path).unwrap();
        assert_eq!(moved.milestone.as_deref(), Some("v1"));
        assert_eq!(moved.id, issue.id);
    }

    #[test]
    fn title_rename_moves_the_file() {
        let (_temp, ws) = workspace();
        let mut issue = Issue::new("a1b2c3d4", "Old title", t0());
        let old_path = ws.save_issue(&issue, None).unwrap();

        issue.title = "New title".to_string();
        let new_path = ws.save_issue(&issue, Some(&old_path)).unwrap();

        assert!(!old_path.exists());
        assert!(new_path.ends_with("issues/backlog/new-title-a1b2c3d4.md"));
    }

    #[test]
    fn scan_finds_all_kinds() {
        let (_temp, ws) = workspace();
        let issue = Issue::new("a1b2c3d4", "An issue", t0());
        ws.save_issue(&issue, None).unwrap();

        let milestone = Milestone {
            name: "v1".to_string(),
            state: crate::model::MilestoneState::Open,
            due: None,
            created: t0(),
            updated: t0(),
            body: String::new(),
        };
        ws.save_milestone(&milestone, None).unwrap();

        let files = ws.scan().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.kind == EntityKind::Issue));
        assert!(files.iter().any(|f| f.kind == EntityKind::Milestone));
    }

    #[test]
    fn list_issues_skips_malformed_files() {
        let (_temp, ws) = workspace();
        for n in 0..3 {
            let issue = Issue::new(format!("a1b2c3d{n}"), format!("Issue {n}"), t0());
            ws.save_issue(&issue, None).unwrap();
        }
        fs::write(
            ws.root().join("issues/backlog/broken-zzzzzzzz.md"),
            "no metadata here\n",
        )
        .unwrap();

        let (issues, failures) = ws.list_issues().unwrap();
        assert_eq!(issues.len(), 3);
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn write_sync_metadata_preserves_fields() {
        let (_temp, ws) = workspace();
        let issue = Issue::new("a1b2c3d4", "An issue", t0());
        let path = ws.save_issue(&issue, None).unwrap();

        let sync = SyncMetadata {
            last_synced: t0(),
            remote_state: None,
        };
        let path = ws.write_sync_metadata(&path, Some(sync.clone())).unwrap();

        let loaded = ws.load_issue(&path).unwrap();
        assert_eq!(loaded.sync, Some(sync));
        assert_eq!(loaded.title, issue.title);
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let (_temp, ws) = workspace();
        let issue = Issue::new("a1b2c3d4", "An issue", t0());
        let path = ws.save_issue(&issue, None).unwrap();

        let siblings: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(
            siblings
                .iter()
                .all(|name| !name.to_string_lossy().ends_with(".tmp"))
        );
    }
}
