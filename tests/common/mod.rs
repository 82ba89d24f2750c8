//! Shared harness for end-to-end CLI tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A throwaway workspace directory for driving the `dk` binary.
pub struct DkWorkspace {
    temp: TempDir,
}

/// Captured output of one `dk` invocation.
pub struct RunOutput {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl DkWorkspace {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn docket_dir(&self) -> PathBuf {
        self.temp.path().join(".docket")
    }
}

/// Run `dk` with the given args inside the workspace.
pub fn run_dk<I, S>(workspace: &DkWorkspace, args: I, label: &str) -> RunOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = assert_cmd::Command::cargo_bin("dk")
        .expect("dk binary")
        .args(args)
        .current_dir(workspace.path())
        .env_remove("DOCKET_DIR")
        .env_remove("DOCKET_DEFAULT_PRIORITY")
        .env_remove("DOCKET_LOG")
        .output()
        .unwrap_or_else(|e| panic!("{label}: failed to run dk: {e}"));

    RunOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Run git in the workspace with a fixed identity.
pub fn run_git(workspace: &DkWorkspace, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(workspace.path())
        .args(args)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git runs");
    assert!(status.success(), "git {args:?} failed");
}

/// Parse "Created <id>: <title>" output into the id.
pub fn parse_created_id(stdout: &str) -> String {
    let line = stdout.lines().next().unwrap_or("");
    line.strip_prefix("Created ")
        .and_then(|rest| rest.split(':').next())
        .unwrap_or("")
        .trim()
        .to_string()
}

/// The single issue file matching `id` anywhere under issues/.
pub fn issue_files_for_id(workspace: &DkWorkspace, id: &str) -> Vec<PathBuf> {
    let issues_root = workspace.docket_dir().join("issues");
    let mut found = Vec::new();
    if let Ok(groups) = std::fs::read_dir(&issues_root) {
        for group in groups.flatten() {
            if !group.path().is_dir() {
                continue;
            }
            if let Ok(entries) = std::fs::read_dir(group.path()) {
                for entry in entries.flatten() {
                    let name = entry.file_name().to_string_lossy().to_string();
                    if name.ends_with(&format!("-{id}.md")) {
                        found.push(entry.path());
                    }
                }
            }
        }
    }
    found
}
