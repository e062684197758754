//! Write changelog sections.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ChangelogError;

use super::format::{CHANGELOG_HEADER, ReleaseNotes};
use super::parser::{find_insertion_point, read_changelog};

/// What a changelog write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogUpdate {
    /// Sections were inserted at the top of the file.
    Prepended { sections: usize },
    /// The file was rewritten from scratch.
    Replaced { sections: usize },
    /// Every section was already present; the file is untouched.
    Unchanged,
}

/// Insert release sections above the existing ones.
///
/// - Creates the file with a header if it doesn't exist
/// - Backs up an existing file to `<filename>.md.bak`
/// - Skips releases whose version already has a section
/// - Keeps an `[Unreleased]` section on top
pub fn prepend_releases(
    path: &Path,
    releases: &[ReleaseNotes],
) -> Result<ChangelogUpdate, ChangelogError> {
    let existing = read_changelog(path)?;

    let fresh: Vec<&ReleaseNotes> = releases
        .iter()
        .filter(|notes| {
            let present = existing
                .as_ref()
                .is_some_and(|parsed| parsed.has_version(&notes.version));
            if present {
                debug!(version = %notes.version, "Changelog section already exists");
            }
            !present
        })
        .collect();

    if fresh.is_empty() {
        return Ok(ChangelogUpdate::Unchanged);
    }

    let sections: String = fresh.iter().map(|notes| notes.render()).collect();

    let new_content = match existing {
        Some(existing) => {
            backup(path)?;
            let insertion_point = find_insertion_point(&existing.raw_content);
            let (head, tail) = existing.raw_content.split_at(insertion_point);

            let mut content = String::with_capacity(existing.raw_content.len() + sections.len());
            content.push_str(head);
            if !head.is_empty() && !head.ends_with('\n') {
                content.push_str("\n\n");
            } else if !head.is_empty() && !head.ends_with("\n\n") {
                content.push('\n');
            }
            content.push_str(&sections);
            content.push_str(tail);
            content
        }
        None => format!("{}{}", CHANGELOG_HEADER, sections),
    };

    write_atomic(path, &new_content)?;
    Ok(ChangelogUpdate::Prepended {
        sections: fresh.len(),
    })
}

/// Rewrite the whole changelog from the given releases, newest first.
pub fn replace_changelog(
    path: &Path,
    releases: &[ReleaseNotes],
) -> Result<ChangelogUpdate, ChangelogError> {
    if path.exists() {
        backup(path)?;
    }

    let mut content = CHANGELOG_HEADER.to_string();
    for notes in releases {
        content.push_str(&notes.render());
    }

    write_atomic(path, &content)?;
    Ok(ChangelogUpdate::Replaced {
        sections: releases.len(),
    })
}

fn backup(path: &Path) -> Result<(), ChangelogError> {
    let backup_path = path.with_extension("md.bak");
    std::fs::copy(path, &backup_path).map_err(ChangelogError::BackupFailed)?;
    debug!(backup = %backup_path.display(), "Backed up changelog");
    Ok(())
}

/// Write through a temp file in the same directory so a failed write never
/// leaves a truncated changelog behind.
fn write_atomic(path: &Path, content: &str) -> Result<(), ChangelogError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(ChangelogError::WriteFailed)?;
    file.write_all(content.as_bytes())
        .map_err(ChangelogError::WriteFailed)?;
    file.persist(path)
        .map_err(|e| ChangelogError::WriteFailed(e.error))?;
    Ok(())
}
