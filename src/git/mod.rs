//! Git operations using git2-rs.

pub mod commits;
pub mod parser;
pub mod range;
pub mod tags;

pub use commits::{RawCommit, fetch_raw_commits, parse_commits};
pub use parser::{ParsedCommit, parse_raw_commit, parse_raw_text};
pub use range::{ReleaseRange, release_ranges};
pub use tags::{LatestTag, TagInfo, get_latest_reachable_tag, get_version_from_tag, tag_name_for};
