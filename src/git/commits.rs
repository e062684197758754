//! Commit fetching.

use git2::{Oid, Repository};
use serde::Serialize;
use tracing::debug;

use crate::error::GitError;

use super::parser::{ParsedCommit, parse_raw_commit};
use super::tags::LatestTag;

/// A commit as read from history: hash plus the full message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawCommit {
    pub hash: String,
    pub message: String,
}

impl RawCommit {
    fn from_git2_commit(commit: &git2::Commit) -> Self {
        Self {
            hash: commit.id().to_string(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        }
    }
}

/// Fetch every commit reachable from `to` but not from `hide`, newest first.
pub fn fetch_commits_between(
    repo: &Repository,
    hide: Option<Oid>,
    to: Oid,
) -> Result<Vec<RawCommit>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    revwalk.push(to).map_err(GitError::RevwalkError)?;
    if let Some(hide) = hide {
        revwalk.hide(hide).map_err(GitError::RevwalkError)?;
    }

    let mut commits = Vec::new();
    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        commits.push(RawCommit::from_git2_commit(&commit));
    }

    Ok(commits)
}

/// Fetch the commits made since the latest release tag.
///
/// For a first release the whole history reachable from HEAD is returned,
/// root commit included.
pub fn fetch_raw_commits(repo: &Repository, latest: &LatestTag) -> Result<Vec<RawCommit>, GitError> {
    let head = repo
        .head()
        .map_err(|e| GitError::ReferenceNotFound("HEAD".to_string(), e))?
        .peel_to_commit()
        .map_err(GitError::ParseCommit)?;

    let hide = match latest {
        LatestTag::FirstRelease => None,
        LatestTag::Tagged(tag) => Some(tag.oid),
    };

    let commits = fetch_commits_between(repo, hide, head.id())?;
    debug!(count = commits.len(), range = %latest.range_spec(), "Fetched commits");
    Ok(commits)
}

/// Parse raw commits, dropping the ones that do not follow the grammar.
pub fn parse_commits(raw: &[RawCommit]) -> Vec<ParsedCommit> {
    raw.iter()
        .filter_map(|commit| {
            let parsed = parse_raw_commit(commit);
            if parsed.is_none() {
                debug!(hash = %commit.hash, "Skipping non-conventional commit");
            }
            parsed
        })
        .collect()
}
