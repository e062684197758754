//! semrel - fully automated semantic releases from conventional commits.
//!
//! # Overview
//!
//! semrel reads the commits since the latest semver tag, classifies them
//! by the Angular commit convention, and when a release is warranted bumps
//! the package manifest, prepends release notes to CHANGELOG.md, then
//! commits, tags and pushes.
//!
//! The core is pure: [`parse_raw_commit`] turns one commit message into a
//! [`ParsedCommit`], [`classify`] folds a range into a [`BumpType`], and
//! [`should_release`] decides whether the pipeline continues.

pub mod changelog;
pub mod config;
pub mod error;
pub mod git;
pub mod release;
pub mod version;

// Re-export commonly used types
pub use changelog::{ChangelogCategory, ChangelogEntry, ReleaseNotes};
pub use config::{FileConfig, ReleaseConfig};
pub use error::{ChangelogError, ConfigError, GitError, ReleaseError};
pub use git::{LatestTag, ParsedCommit, RawCommit, parse_raw_commit};
pub use release::gate::{ReleaseDecision, SkipDetail, SkipReason, should_release};
pub use release::{ReleaseOutcome, run_release};
pub use version::{BumpType, classify};
