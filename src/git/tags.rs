//! Tag enumeration and latest-release detection.

use std::collections::HashMap;
use std::fmt;

use git2::Repository;
use semver::Version;
use tracing::{debug, warn};

use crate::error::GitError;

/// A git tag with optional semver version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub oid: git2::Oid,
    pub version: Option<Version>,
}

/// Where the commit range for this release starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestTag {
    /// No semver tag is reachable from HEAD yet.
    FirstRelease,
    /// The most recent release tag reachable from HEAD.
    Tagged(TagInfo),
}

impl LatestTag {
    pub fn is_first_release(&self) -> bool {
        matches!(self, Self::FirstRelease)
    }

    /// Version of the latest release, if any.
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::FirstRelease => None,
            Self::Tagged(tag) => tag.version.as_ref(),
        }
    }

    /// Revision range in `git log` notation, e.g. `v1.0.0..HEAD`.
    pub fn range_spec(&self) -> String {
        match self {
            Self::FirstRelease => "HEAD".to_string(),
            Self::Tagged(tag) => format!("{}..HEAD", tag.name),
        }
    }
}

impl fmt::Display for LatestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstRelease => write!(f, "(none)"),
            Self::Tagged(tag) => write!(f, "{}", tag.name),
        }
    }
}

/// Tag name for a release version: `<prefix>v<version>`.
pub fn tag_name_for(prefix: &str, version: &Version) -> String {
    format!("{}v{}", prefix, version)
}

/// Extract semver version from a tag name.
///
/// The prefix is stripped first; a leading `v` is optional, so both
/// `v1.2.3` and `1.2.3` are recognised.
pub fn get_version_from_tag(tag_name: &str, prefix: &str) -> Option<Version> {
    let unprefixed = tag_name.strip_prefix(prefix)?;
    let version_str = unprefixed.strip_prefix('v').unwrap_or(unprefixed);
    Version::parse(version_str).ok()
}

/// Find the latest release tag reachable from HEAD.
///
/// Walks commits reachable from `HEAD` newest-first and returns the first
/// commit that has a `<prefix>` semver tag attached, preferring the highest
/// version when a commit carries several.
pub fn get_latest_reachable_tag(repo: &Repository, prefix: &str) -> Result<LatestTag, GitError> {
    let head_oid = match repo.head().ok().and_then(|head| head.target()) {
        Some(oid) => oid,
        None => return Ok(LatestTag::FirstRelease),
    };

    let mut tags_by_commit: HashMap<git2::Oid, Vec<TagInfo>> = HashMap::new();
    for tag in get_release_tags(repo, prefix)? {
        tags_by_commit.entry(tag.oid).or_default().push(tag);
    }

    if tags_by_commit.is_empty() {
        debug!(prefix, "No semver tags found in repository");
        return Ok(LatestTag::FirstRelease);
    }

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk.push(head_oid).map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    for oid in revwalk {
        let oid = oid.map_err(GitError::RevwalkError)?;
        if let Some(candidates) = tags_by_commit.get(&oid) {
            let latest = candidates
                .iter()
                .max_by(|a, b| a.version.cmp(&b.version))
                .cloned();
            if let Some(tag) = latest {
                debug!(tag = %tag.name, "Found latest reachable semver tag");
                return Ok(LatestTag::Tagged(tag));
            }
        }
    }

    Ok(LatestTag::FirstRelease)
}

/// All tags whose name is `<prefix>` followed by a semver version,
/// sorted by ascending version.
pub fn get_release_tags(repo: &Repository, prefix: &str) -> Result<Vec<TagInfo>, GitError> {
    let mut tags: Vec<TagInfo> = get_all_tags(repo, prefix)?
        .into_iter()
        .filter(|tag| tag.version.is_some())
        .collect();
    tags.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(tags)
}

/// Get all tags from the repository.
///
/// `version` is filled in only for names matching `<prefix>` + semver.
pub fn get_all_tags(repo: &Repository, prefix: &str) -> Result<Vec<TagInfo>, GitError> {
    let mut tags = Vec::new();

    repo.tag_foreach(|oid, name_bytes| {
        if let Ok(name_str) = std::str::from_utf8(name_bytes) {
            let name = name_str
                .strip_prefix("refs/tags/")
                .unwrap_or(name_str)
                .to_string();

            let version = get_version_from_tag(&name, prefix);

            // Annotated tags point at a tag object; peel to the commit.
            let resolved_oid = match repo.find_tag(oid) {
                Ok(tag_obj) => tag_obj.target_id(),
                Err(_) => oid,
            };

            tags.push(TagInfo {
                name,
                oid: resolved_oid,
                version,
            });
        } else {
            warn!("Skipping tag with OID {} - name is not valid UTF-8", oid);
        }
        true
    })
    .map_err(GitError::RevwalkError)?;

    Ok(tags)
}

/// Check if a tag already exists.
pub fn tag_exists(repo: &Repository, tag_name: &str) -> Result<bool, GitError> {
    match repo.find_reference(&format!("refs/tags/{}", tag_name)) {
        Ok(_) => Ok(true),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
        Err(e) => Err(GitError::ReferenceNotFound(tag_name.to_string(), e)),
    }
}
