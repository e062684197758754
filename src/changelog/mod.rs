//! Changelog rendering, parsing and writing.

pub mod format;
pub mod parser;
pub mod writer;

pub use format::{ChangelogCategory, ChangelogEntry, ReleaseNotes};
pub use parser::read_changelog;
pub use writer::{ChangelogUpdate, prepend_releases, replace_changelog};
