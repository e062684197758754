//! Preflight checks for the release pipeline.
//!
//! Validates the environment and the branch before anything is read from
//! history or written to disk.

use git2::Repository;
use tracing::info;

use crate::error::ReleaseError;

/// Branch value that allows releasing from any branch.
pub const ANY_BRANCH: &str = "*";

/// Fail early when the `git` binary is missing; commit, tag and push
/// shell out to it.
pub fn check_git_installed() -> Result<(), ReleaseError> {
    which::which("git")
        .map(|_| ())
        .map_err(|_| ReleaseError::GitNotInstalled)
}

/// Get the current branch name.
pub fn get_current_branch(repo: &Repository) -> Result<String, ReleaseError> {
    let head = repo
        .head()
        .map_err(|e| ReleaseError::GitFailed(format!("Could not determine HEAD: {}", e)))?;

    if !head.is_branch() {
        return Err(ReleaseError::DetachedHead);
    }

    head.shorthand()
        .map(String::from)
        .ok_or_else(|| ReleaseError::GitFailed("Could not determine current branch".into()))
}

/// Check that HEAD is on the allowed release branch.
///
/// `*` allows any branch, including a detached HEAD.
pub fn validate_branch(repo: &Repository, allowed: &str) -> Result<(), ReleaseError> {
    if allowed == ANY_BRANCH {
        return Ok(());
    }

    let current = get_current_branch(repo)?;
    if current != allowed {
        return Err(ReleaseError::WrongBranch {
            current,
            allowed: allowed.to_string(),
        });
    }

    info!(branch = %current, "Release branch validated");
    Ok(())
}
