//! Side effects of a release: scripts, commit, tag, push and rollback.
//!
//! Git operations shell out to the system `git` binary, inheriting the
//! user's git config, SSH agent and credential store.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::error::ReleaseError;

use super::scripts::{ScriptHook, run_script};

/// Every externally visible step of a release.
///
/// This abstraction allows mocking git and scripts in tests.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseExecutor {
    /// Run a configured hook script.
    fn run_script(&self, hook: ScriptHook, command: &str, version: &str) -> Result<(), ReleaseError>;

    /// `git add <files>`
    fn stage(&self, files: &[PathBuf]) -> Result<(), ReleaseError>;

    /// `git commit -m <message>`
    fn commit(&self, message: &str) -> Result<(), ReleaseError>;

    /// `git tag <name>`
    fn tag(&self, name: &str) -> Result<(), ReleaseError>;

    /// Push the branch, then the tags.
    fn push(&self) -> Result<(), ReleaseError>;

    /// Delete the local tag and undo the release commit, keeping changes staged.
    fn rollback(&self, tag_name: &str) -> Result<(), ReleaseError>;
}

/// Executor that runs the real `git` CLI in a working directory.
pub struct GitCliExecutor {
    workdir: PathBuf,
    /// Exit code to report instead of running `git push`.
    mock_push: Option<i32>,
}

impl GitCliExecutor {
    pub fn new(workdir: impl Into<PathBuf>, mock_push: Option<i32>) -> Self {
        Self {
            workdir: workdir.into(),
            mock_push,
        }
    }

    /// Run a git command and return success or a descriptive error.
    fn run_git<S: AsRef<OsStr> + std::fmt::Debug>(
        &self,
        args: &[S],
        operation: &str,
    ) -> Result<(), ReleaseError> {
        debug!(?args, "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| {
                ReleaseError::GitFailed(format!("Failed to run git {}: {}", operation, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::GitFailed(format!(
                "git {} failed: {}",
                operation,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl ReleaseExecutor for GitCliExecutor {
    fn run_script(&self, hook: ScriptHook, command: &str, version: &str) -> Result<(), ReleaseError> {
        run_script(hook, command, version, &self.workdir)
    }

    fn stage(&self, files: &[PathBuf]) -> Result<(), ReleaseError> {
        if files.is_empty() {
            return Err(ReleaseError::GitFailed("No files to stage".into()));
        }

        // Paths go through as OsStr; non-UTF-8 names are staged too.
        let mut add_args: Vec<&OsStr> = vec![OsStr::new("add"), OsStr::new("--")];
        add_args.extend(files.iter().map(|p| p.as_os_str()));
        self.run_git(&add_args, "add")
    }

    fn commit(&self, message: &str) -> Result<(), ReleaseError> {
        self.run_git(&["commit", "-m", message], "commit")
    }

    fn tag(&self, name: &str) -> Result<(), ReleaseError> {
        self.run_git(&["tag", name], "tag")
    }

    fn push(&self) -> Result<(), ReleaseError> {
        if let Some(code) = self.mock_push {
            info!(code, "Mocking git push");
            return match code {
                0 => Ok(()),
                code => Err(ReleaseError::PushFailed(format!(
                    "mocked git push exited with code {}",
                    code
                ))),
            };
        }

        self.run_git(&["push"], "push")
            .and_then(|()| self.run_git(&["push", "--tags"], "push --tags"))
            .map_err(|e| ReleaseError::PushFailed(e.to_string()))
    }

    fn rollback(&self, tag_name: &str) -> Result<(), ReleaseError> {
        self.run_git(&["tag", "-d", tag_name], "tag -d")?;
        self.run_git(&["reset", "--soft", "HEAD~1"], "reset --soft")
    }
}
