//! Bump classification and semver calculation from commits.

use std::fmt;

use semver::Version;
use serde::Serialize;
use tracing::debug;

use crate::git::{LatestTag, ParsedCommit};

/// Version of the very first release, regardless of the commits in it.
pub const INITIAL_VERSION: Version = Version::new(1, 0, 0);

/// Type of version bump, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// Nothing in range warrants a release.
    None,
    Patch,
    Minor,
    Major,
}

impl BumpType {
    /// Bump required by a single commit.
    ///
    /// - `BREAKING CHANGE:` note = major
    /// - `feat` = minor
    /// - `fix` = patch
    pub fn of_commit(commit: &ParsedCommit) -> Self {
        if commit.is_breaking() {
            return Self::Major;
        }
        match commit.commit_type.as_str() {
            "feat" => Self::Minor,
            "fix" => Self::Patch,
            _ => Self::None,
        }
    }

    pub fn is_release(self) -> bool {
        self != Self::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determine the bump type from a list of commits.
///
/// The most severe bump wins; the scan stops at the first major.
pub fn classify(commits: &[ParsedCommit]) -> BumpType {
    let mut highest = BumpType::None;

    for commit in commits {
        let bump = BumpType::of_commit(commit);
        if bump == BumpType::Major {
            highest = bump;
            break;
        }
        highest = highest.max(bump);
    }

    debug!(bump = %highest, commits = commits.len(), "Bump type");
    highest
}

/// Apply a bump to a version. Pre-release and build metadata are dropped.
pub fn apply_bump_to_version(base: &Version, bump: BumpType) -> Version {
    match bump {
        BumpType::Major => Version::new(base.major + 1, 0, 0),
        BumpType::Minor => Version::new(base.major, base.minor + 1, 0),
        BumpType::Patch => Version::new(base.major, base.minor, base.patch + 1),
        BumpType::None => Version::new(base.major, base.minor, base.patch),
    }
}

/// Calculate the version of the next release.
///
/// Returns `None` when the bump is `None`.
pub fn next_version(latest: &LatestTag, bump: BumpType) -> Option<Version> {
    bump.is_release().then(|| release_version(latest, bump))
}

/// Version for a release that has passed the gate. A first release is
/// always [`INITIAL_VERSION`].
pub fn release_version(latest: &LatestTag, bump: BumpType) -> Version {
    latest
        .version()
        .map_or(INITIAL_VERSION, |base| apply_bump_to_version(base, bump))
}
