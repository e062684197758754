//! Read existing changelog using parse-changelog.

use std::path::Path;

use semver::Version;
use tracing::debug;

use crate::error::ChangelogError;

/// Parsed changelog information.
#[derive(Debug)]
pub struct ParsedChangelog {
    /// Versions that already have a section, in file order.
    pub versions: Vec<String>,
    pub raw_content: String,
}

impl ParsedChangelog {
    pub fn has_version(&self, version: &Version) -> bool {
        let wanted = version.to_string();
        self.versions.iter().any(|v| *v == wanted)
    }
}

/// Read and parse an existing changelog file.
///
/// Returns `Ok(None)` when the file does not exist. A file without any
/// release section (e.g. only a title) parses to an empty version list.
pub fn read_changelog(path: &Path) -> Result<Option<ParsedChangelog>, ChangelogError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(ChangelogError::ReadFailed)?;
    Ok(Some(parse_content(content)))
}

fn parse_content(content: String) -> ParsedChangelog {
    let versions = match parse_changelog::parse(&content) {
        Ok(changelog) => changelog
            .keys()
            .filter(|key| !key.eq_ignore_ascii_case("unreleased"))
            .map(|key| key.to_string())
            .collect(),
        Err(e) => {
            debug!(error = %e, "No release sections recognised in changelog");
            Vec::new()
        }
    };

    ParsedChangelog {
        versions,
        raw_content: content,
    }
}

/// Find the position to insert a new version section.
/// Returns the byte offset after the header and any [Unreleased] section.
pub fn find_insertion_point(content: &str) -> usize {
    let mut offset = 0;
    let mut in_unreleased = false;

    for line in content.split_inclusive('\n') {
        if line.starts_with("## ") {
            if in_unreleased {
                return offset;
            }
            if line.to_lowercase().contains("unreleased") {
                in_unreleased = true;
            } else {
                return offset;
            }
        }
        offset += line.len();
    }

    content.len()
}
