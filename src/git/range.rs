//! Commit ranges between consecutive release tags.

use chrono::{NaiveDate, TimeZone, Utc};
use git2::{Oid, Repository};
use semver::Version;

use crate::error::GitError;

use super::commits::{RawCommit, fetch_commits_between};
use super::tags::get_release_tags;

/// The commits that went into one tagged release.
#[derive(Debug, Clone)]
pub struct ReleaseRange {
    pub tag_name: String,
    pub version: Version,
    /// Commit the tag points at.
    pub to: Oid,
    /// Previous release's commit; `None` for the oldest release.
    pub from: Option<Oid>,
}

impl ReleaseRange {
    /// Raw commits of this release, newest first.
    pub fn commits(&self, repo: &Repository) -> Result<Vec<RawCommit>, GitError> {
        fetch_commits_between(repo, self.from, self.to)
    }

    /// Commit date of the tagged commit, in UTC.
    pub fn date(&self, repo: &Repository) -> Result<NaiveDate, GitError> {
        let commit = repo.find_commit(self.to).map_err(GitError::ParseCommit)?;
        let seconds = commit.time().seconds();
        Utc.timestamp_opt(seconds, 0)
            .single()
            .map(|dt| dt.date_naive())
            .ok_or_else(|| GitError::InvalidTimestamp {
                hash: commit.id().to_string(),
                seconds,
            })
    }
}

/// Ranges for every tagged release, newest release first.
///
/// Tags are ordered by version; each range starts after the previous
/// version's tag.
pub fn release_ranges(repo: &Repository, prefix: &str) -> Result<Vec<ReleaseRange>, GitError> {
    let tags = get_release_tags(repo, prefix)?;

    let mut ranges: Vec<ReleaseRange> = Vec::with_capacity(tags.len());
    let mut previous: Option<Oid> = None;
    for tag in tags {
        let Some(version) = tag.version else {
            continue;
        };
        // One range per commit, named after its highest version.
        if previous == Some(tag.oid) {
            if let Some(last) = ranges.last_mut() {
                last.tag_name = tag.name;
                last.version = version;
            }
            continue;
        }
        ranges.push(ReleaseRange {
            tag_name: tag.name,
            version,
            to: tag.oid,
            from: previous,
        });
        previous = Some(tag.oid);
    }

    ranges.reverse();
    Ok(ranges)
}
