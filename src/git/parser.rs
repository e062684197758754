//! Conventional commit parsing.
//!
//! Turns one raw commit into a [`ParsedCommit`], or rejects it when the subject
//! line does not follow the `type(scope): description` grammar. Rejected
//! commits (merges, WIP, free-form messages) simply take no part in the
//! release decision.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;
use tracing::debug;

use super::commits::RawCommit;

/// Descriptions longer than this are cut to exactly this many characters.
pub const MAX_SUBJECT_LENGTH: usize = 80;

/// `type(scope): description`. The scope class has no `/`, so
/// `feat(a/b): x` is rejected outright. A `\r` in the description (CRLF
/// message) rejects the commit too.
static COMMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w*)(?:\(([\w$.\-* ]*)\))?: ([^\r]*)$").expect("commit pattern is valid")
});

/// Single-issue annotation inside the subject line.
static SUBJECT_CLOSES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:closes|fixes|resolves)\s#(\d+)").expect("subject closes pattern is valid")
});

/// Body annotation; one keyword may be followed by `#1, #2, ...`.
static BODY_CLOSES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:closes|fixes|resolves)\s((?:#\d+(?:,\s)?)+)")
        .expect("body closes pattern is valid")
});

static ISSUE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("issue number pattern is valid"));

/// Greedy to end of message: later markers end up inside the first block.
static BREAKING_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)BREAKING CHANGE:\s(.*)").expect("breaking change pattern is valid")
});

/// A commit whose subject follows the conventional commit grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommit {
    pub hash: String,
    /// Free-form type token (`feat`, `fix`, `chore`, ...).
    #[serde(rename = "type")]
    pub commit_type: String,
    /// Scope from the parenthesised segment, `None` when absent or empty.
    pub component: Option<String>,
    pub subject: String,
    pub body: String,
    pub closes: Vec<u32>,
    pub breaks: Vec<String>,
}

impl ParsedCommit {
    /// Whether the commit carries a `BREAKING CHANGE:` note.
    pub fn is_breaking(&self) -> bool {
        !self.breaks.is_empty()
    }

    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }
}

/// Parse a raw commit. Returns `None` for non-conforming messages.
pub fn parse_raw_commit(raw: &RawCommit) -> Option<ParsedCommit> {
    let mut lines = raw.message.split('\n');
    let subject_line = lines.next()?;
    let body_lines: Vec<&str> = lines.collect();

    let (subject, mut closes) = strip_subject_closes(subject_line);
    for line in &body_lines {
        closes.extend(body_closes(line));
    }

    let breaks = breaking_change(&raw.message).into_iter().collect();

    let caps = COMMIT_PATTERN.captures(&subject)?;
    let commit_type = caps.get(1).map(|m| m.as_str()).filter(|t| !t.is_empty())?;
    let description = caps.get(3).map(|m| m.as_str()).filter(|d| !d.is_empty())?;
    let component = caps
        .get(2)
        .map(|m| m.as_str())
        .filter(|c| !c.is_empty())
        .map(String::from);

    Some(ParsedCommit {
        hash: raw.hash.clone(),
        commit_type: commit_type.to_string(),
        component,
        subject: truncate_subject(description),
        body: body_lines.join("\n"),
        closes,
        breaks,
    })
}

/// Parse `"<hash>\n<message>"`, the layout produced by
/// `git log --format=%H%n%B`.
pub fn parse_raw_text(raw: &str) -> Option<ParsedCommit> {
    let (hash, message) = raw.split_once('\n')?;
    parse_raw_commit(&RawCommit {
        hash: hash.to_string(),
        message: message.to_string(),
    })
}

/// Remove `Closes #N` annotations from the subject, returning the cleaned
/// subject and the issue numbers in order of appearance.
fn strip_subject_closes(subject: &str) -> (String, Vec<u32>) {
    let closes = SUBJECT_CLOSES
        .captures_iter(subject)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| issue_number(m.as_str()))
        .collect();
    let stripped = SUBJECT_CLOSES.replace_all(subject, "").into_owned();
    (stripped, closes)
}

fn body_closes(line: &str) -> Vec<u32> {
    BODY_CLOSES
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .flat_map(|refs| {
            refs.as_str()
                .split(',')
                .filter_map(|piece| ISSUE_NUMBER.find(piece))
                .filter_map(|m| issue_number(m.as_str()))
                .collect::<Vec<u32>>()
        })
        .collect()
}

fn issue_number(digits: &str) -> Option<u32> {
    match digits.parse() {
        Ok(number) => Some(number),
        Err(e) => {
            debug!(reference = %digits, error = %e, "Dropping out-of-range issue reference");
            None
        }
    }
}

fn breaking_change(message: &str) -> Option<String> {
    BREAKING_CHANGE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}\n", m.as_str()))
}

fn truncate_subject(description: &str) -> String {
    description.chars().take(MAX_SUBJECT_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(message: &str) -> RawCommit {
        RawCommit {
            hash: "abc123".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_parse_type_scope_subject() {
        let parsed = parse_raw_commit(&raw("feat(scope): add login\n\nCloses #42")).unwrap();
        assert_eq!(parsed.hash, "abc123");
        assert_eq!(parsed.commit_type, "feat");
        assert_eq!(parsed.component.as_deref(), Some("scope"));
        assert_eq!(parsed.subject, "add login");
        assert_eq!(parsed.closes, vec![42]);
        assert!(parsed.breaks.is_empty());
    }

    #[test]
    fn test_parse_without_scope() {
        let parsed = parse_raw_commit(&raw("fix: handle empty input")).unwrap();
        assert_eq!(parsed.commit_type, "fix");
        assert_eq!(parsed.component, None);
        assert_eq!(parsed.subject, "handle empty input");
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn test_empty_scope_is_absent() {
        let parsed = parse_raw_commit(&raw("chore(): tidy")).unwrap();
        assert_eq!(parsed.component, None);
    }

    #[test]
    fn test_scope_special_characters() {
        let parsed = parse_raw_commit(&raw("fix($compile.x-y *): ok")).unwrap();
        assert_eq!(parsed.component.as_deref(), Some("$compile.x-y *"));
    }

    #[test]
    fn test_scope_with_slash_is_rejected() {
        assert!(parse_raw_commit(&raw("feat(scope/foo): x")).is_none());
    }

    #[test]
    fn test_missing_space_after_colon_is_rejected() {
        assert!(parse_raw_commit(&raw("feat:no space")).is_none());
    }

    #[test]
    fn test_empty_type_or_description_is_rejected() {
        assert!(parse_raw_commit(&raw(": nothing")).is_none());
        assert!(parse_raw_commit(&raw("feat: ")).is_none());
        assert!(parse_raw_commit(&raw("")).is_none());
    }

    #[test]
    fn test_non_conventional_is_rejected() {
        assert!(parse_raw_commit(&raw("Merge branch 'main' into dev")).is_none());
        assert!(parse_raw_commit(&raw("WIP")).is_none());
    }

    #[test]
    fn test_subject_truncated_to_80_chars() {
        let description = "x".repeat(100);
        let parsed = parse_raw_commit(&raw(&format!("feat: {}", description))).unwrap();
        assert_eq!(parsed.subject, "x".repeat(80));
    }

    #[test]
    fn test_subject_closes_are_stripped() {
        let parsed = parse_raw_commit(&raw("fix: crash on start closes #7 Fixes #8")).unwrap();
        assert_eq!(parsed.subject, "crash on start");
        assert_eq!(parsed.closes, vec![7, 8]);
    }

    #[test]
    fn test_body_closes_multiple_refs() {
        let message = "fix: things\n\nResolves #1, #2, #3\nsome text fixes #10";
        let parsed = parse_raw_commit(&raw(message)).unwrap();
        assert_eq!(parsed.closes, vec![1, 2, 3, 10]);
    }

    #[test]
    fn test_crlf_message_is_rejected() {
        assert!(parse_raw_commit(&raw("feat: add x\r\n\r\nbody\r\n")).is_none());

        let parsed = parse_raw_commit(&raw("feat: add x\n\nbody\n")).unwrap();
        assert_eq!(parsed.subject, "add x");
    }

    #[test]
    fn test_out_of_range_issue_reference_is_dropped() {
        let message = "fix: a Closes #99999999999\n\nCloses #5";
        let parsed = parse_raw_commit(&raw(message)).unwrap();
        assert_eq!(parsed.subject, "a");
        assert_eq!(parsed.closes, vec![5]);
    }

    #[test]
    fn test_subject_closes_come_before_body() {
        let message = "feat: a Closes #5\n\nCloses #6";
        let parsed = parse_raw_commit(&raw(message)).unwrap();
        assert_eq!(parsed.closes, vec![5, 6]);
    }

    #[test]
    fn test_breaking_change_block() {
        let parsed = parse_raw_commit(&raw("fix: bug\n\nBREAKING CHANGE:\nThis breaks X")).unwrap();
        assert_eq!(parsed.breaks, vec!["This breaks X\n".to_string()]);
        assert!(parsed.is_breaking());
    }

    #[test]
    fn test_multiple_breaking_markers_form_one_block() {
        let message = "feat: a\n\nBREAKING CHANGE: one\nBREAKING CHANGE: two";
        let parsed = parse_raw_commit(&raw(message)).unwrap();
        assert_eq!(parsed.breaks, vec!["one\nBREAKING CHANGE: two\n".to_string()]);
    }

    #[test]
    fn test_breaking_marker_is_case_sensitive() {
        let parsed = parse_raw_commit(&raw("feat: a\n\nbreaking change: nope")).unwrap();
        assert!(parsed.breaks.is_empty());
    }

    #[test]
    fn test_body_is_remaining_lines() {
        let parsed = parse_raw_commit(&raw("docs: readme\nline one\nline two")).unwrap();
        assert_eq!(parsed.body, "line one\nline two");
    }

    #[test]
    fn test_parse_raw_text_splits_hash() {
        let parsed = parse_raw_text("abc123\nfeat(scope): add login\n\nCloses #42").unwrap();
        assert_eq!(parsed.hash, "abc123");
        assert_eq!(parsed.closes, vec![42]);
        assert!(parse_raw_text("abc123").is_none());
    }

    #[test]
    fn test_short_hash() {
        let mut parsed = parse_raw_commit(&raw("fix: a")).unwrap();
        assert_eq!(parsed.short_hash(), "abc123");
        parsed.hash = "0123456789abcdef".to_string();
        assert_eq!(parsed.short_hash(), "0123456");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = raw("feat(api): x\n\nFixes #3\nBREAKING CHANGE: y");
        assert_eq!(parse_raw_commit(&input), parse_raw_commit(&input));
    }
}
