//! Changelog section layout.
//!
//! One Markdown section per release, grouped by commit type:
//!
//! ```text
//! ## 1.2.0 (2024-05-01)
//!
//! ### Features
//!
//! * **parser:** accept scopes (abc1234), closes #12
//!
//! ### BREAKING CHANGES
//!
//! * config keys were renamed
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use semver::Version;

use crate::git::ParsedCommit;

/// Changelog categories, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangelogCategory {
    Features,
    BugFixes,
    Performance,
}

impl ChangelogCategory {
    /// Category a commit type is listed under; other types are omitted.
    pub fn from_commit_type(commit_type: &str) -> Option<Self> {
        match commit_type {
            "feat" => Some(Self::Features),
            "fix" => Some(Self::BugFixes),
            "perf" => Some(Self::Performance),
            _ => None,
        }
    }

    /// Get the display name for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Features => "Features",
            Self::BugFixes => "Bug Fixes",
            Self::Performance => "Performance Improvements",
        }
    }
}

/// A single changelog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub component: Option<String>,
    pub subject: String,
    pub short_hash: String,
    pub closes: Vec<u32>,
}

impl ChangelogEntry {
    fn from_commit(commit: &ParsedCommit) -> Self {
        Self {
            component: commit.component.clone(),
            subject: commit.subject.clone(),
            short_hash: commit.short_hash().to_string(),
            closes: commit.closes.clone(),
        }
    }

    fn render(&self) -> String {
        let mut line = String::from("* ");
        if let Some(component) = &self.component {
            let _ = write!(line, "**{}:** ", component);
        }
        let _ = write!(line, "{} ({})", self.subject, self.short_hash);
        if !self.closes.is_empty() {
            let refs: Vec<String> = self.closes.iter().map(|n| format!("#{}", n)).collect();
            let _ = write!(line, ", closes {}", refs.join(" "));
        }
        line
    }
}

/// Notes for one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    pub version: Version,
    pub date: NaiveDate,
    pub entries: BTreeMap<ChangelogCategory, Vec<ChangelogEntry>>,
    pub breaking_changes: Vec<String>,
}

impl ReleaseNotes {
    /// Build notes from the parsed commits of a release, newest first.
    pub fn from_commits(version: Version, date: NaiveDate, commits: &[ParsedCommit]) -> Self {
        let mut entries: BTreeMap<ChangelogCategory, Vec<ChangelogEntry>> = BTreeMap::new();
        let mut breaking_changes = Vec::new();

        for commit in commits {
            if let Some(category) = ChangelogCategory::from_commit_type(&commit.commit_type) {
                entries
                    .entry(category)
                    .or_default()
                    .push(ChangelogEntry::from_commit(commit));
            }
            breaking_changes.extend(commit.breaks.iter().map(|b| b.trim_end().to_string()));
        }

        Self {
            version,
            date,
            entries,
            breaking_changes,
        }
    }

    /// Whether nothing would be listed under the heading.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.breaking_changes.is_empty()
    }

    /// Render the section, ending with a blank line.
    pub fn render(&self) -> String {
        let mut section = format!("## {} ({})\n\n", self.version, self.date.format("%Y-%m-%d"));

        for (category, entries) in &self.entries {
            let _ = writeln!(section, "### {}\n", category.as_str());
            for entry in entries {
                let _ = writeln!(section, "{}", entry.render());
            }
            section.push('\n');
        }

        if !self.breaking_changes.is_empty() {
            section.push_str("### BREAKING CHANGES\n\n");
            for note in &self.breaking_changes {
                let _ = writeln!(section, "* {}", note);
            }
            section.push('\n');
        }

        section
    }
}

/// Header for new changelog files.
pub const CHANGELOG_HEADER: &str = "# Changelog\n\n";
