//! Release gate: decide whether the pipeline goes past classification.

use std::fmt;

use serde::Serialize;

use crate::git::{LatestTag, ParsedCommit};
use crate::version::BumpType;

/// What to tell the user alongside a skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "commits")]
pub enum SkipDetail {
    /// Suggest re-running with `--verbose` to list the commits.
    RerunVerboseHint,
    /// Every parsed commit that was considered.
    Commits(Vec<ParsedCommit>),
}

/// Explanation attached to a skipped release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    /// Range the commits were read from, e.g. `v1.0.0..HEAD`.
    pub latest_tag: String,
    pub detail: SkipDetail,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Release is not necessary at this point. Commits since your last tag only \
             contain types that do not trigger a release (docs, style, refactor, test, chore, ...)."
        )?;
        writeln!(f, "Latest tag: {}", self.latest_tag)?;
        match &self.detail {
            SkipDetail::RerunVerboseHint => write!(
                f,
                "Run this command again with -v or --verbose to see the commit list from the last tag until HEAD."
            ),
            SkipDetail::Commits(commits) if commits.is_empty() => {
                write!(f, "No conventional commits since the latest tag.")
            }
            SkipDetail::Commits(commits) => {
                writeln!(f, "Parsed commits since the latest tag:")?;
                for commit in commits {
                    let scope = commit
                        .component
                        .as_deref()
                        .map(|c| format!("({})", c))
                        .unwrap_or_default();
                    writeln!(
                        f,
                        "  {} {}{}: {}",
                        commit.short_hash(),
                        commit.commit_type,
                        scope,
                        commit.subject
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of the release gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseDecision {
    Proceed,
    Skip(SkipReason),
}

impl ReleaseDecision {
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Decide whether a release is necessary.
///
/// A `None` bump skips the release; the reason carries the latest tag
/// reference and, when `verbose`, the commits that were considered.
/// First releases are gated exactly like any other.
pub fn should_release(
    bump: BumpType,
    latest_tag: &LatestTag,
    commits: &[ParsedCommit],
    verbose: bool,
) -> ReleaseDecision {
    if bump.is_release() {
        return ReleaseDecision::Proceed;
    }

    let detail = if verbose {
        SkipDetail::Commits(commits.to_vec())
    } else {
        SkipDetail::RerunVerboseHint
    };

    ReleaseDecision::Skip(SkipReason {
        latest_tag: latest_tag.range_spec(),
        detail,
    })
}
