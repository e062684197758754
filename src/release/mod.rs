//! Release pipeline: automate the full release flow.
//!
//! Orchestrates branch validation, commit classification, the release gate,
//! manifest and changelog updates, hook scripts and git commit/tag/push.

pub mod executor;
pub mod gate;
pub mod preflight;
pub mod scripts;
pub mod version_files;

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use git2::Repository;
use semver::Version;
use tracing::{debug, info};

use crate::changelog::{ChangelogUpdate, ReleaseNotes, prepend_releases, replace_changelog};
use crate::config::ReleaseConfig;
use crate::error::{GitError, ReleaseError};
use crate::git::tags::tag_exists;
use crate::git::{
    LatestTag, ParsedCommit, fetch_raw_commits, get_latest_reachable_tag, parse_commits,
    release_ranges, tag_name_for,
};
use crate::version::{BumpType, classify, release_version};

use self::executor::{GitCliExecutor, ReleaseExecutor};
use self::gate::{ReleaseDecision, SkipReason, should_release};
use self::preflight::{check_git_installed, validate_branch};
use self::scripts::ScriptHook;
use self::version_files::{VersionFile, detect_version_files, update_version_file};

/// Read-only analysis of the commits since the latest release.
#[derive(Debug, Clone)]
pub struct ReleaseAnalysis {
    pub latest_tag: LatestTag,
    pub commits: Vec<ParsedCommit>,
    pub bump: BumpType,
    pub decision: ReleaseDecision,
}

/// How a release run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Nothing warranted a release.
    Skipped(SkipReason),
    /// Dry run: nothing was written.
    DryRun { version: Version, tag: String },
    /// Tag created and pushed.
    Released { version: Version, tag: String },
}

/// Run the full release pipeline in the repository containing the
/// current directory.
pub fn run_release(config: &ReleaseConfig) -> Result<ReleaseOutcome, ReleaseError> {
    check_git_installed()?;

    let repo = Repository::discover(".").map_err(GitError::OpenRepository)?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| ReleaseError::GitFailed("Bare repository not supported".into()))?
        .to_path_buf();

    let executor = GitCliExecutor::new(&workdir, config.mock_push);
    let today = Utc::now().date_naive();

    execute_release(&repo, &workdir, config, &executor, today)
}

/// Classify the commits since the latest release and run the gate.
pub fn analyze(repo: &Repository, config: &ReleaseConfig) -> Result<ReleaseAnalysis, ReleaseError> {
    let latest_tag = get_latest_reachable_tag(repo, &config.tag_prefix)?;
    if latest_tag.is_first_release() {
        info!(
            "No semver tag found. This looks like the first release; it will be {}",
            tag_name_for(&config.tag_prefix, &crate::version::INITIAL_VERSION)
        );
    } else {
        info!(tag = %latest_tag, "Latest semantic tag");
    }

    let raw_commits = fetch_raw_commits(repo, &latest_tag)?;
    let commits = parse_commits(&raw_commits);
    debug!(
        raw = raw_commits.len(),
        conventional = commits.len(),
        "Parsed commits"
    );

    let bump = classify(&commits);
    let decision = should_release(bump, &latest_tag, &commits, config.verbose);

    Ok(ReleaseAnalysis {
        latest_tag,
        commits,
        bump,
        decision,
    })
}

/// Run the pipeline against an open repository with the given executor.
pub fn execute_release<E: ReleaseExecutor>(
    repo: &Repository,
    workdir: &Path,
    config: &ReleaseConfig,
    executor: &E,
    today: NaiveDate,
) -> Result<ReleaseOutcome, ReleaseError> {
    if config.dry_run {
        println!(">> DRY RUN: no changes will be made <<");
        println!();
    }

    // ── Stage 1: Preflight ──
    let version_files = detect_version_files(workdir)?;
    validate_branch(repo, &config.branch)?;

    // ── Stage 2: Classify and gate ──
    let analysis = analyze(repo, config)?;

    if let ReleaseDecision::Skip(reason) = analysis.decision {
        println!("{}", reason);
        return Ok(ReleaseOutcome::Skipped(reason));
    }

    let version = release_version(&analysis.latest_tag, analysis.bump);
    let tag = tag_name_for(&config.tag_prefix, &version);

    println!(
        "Version: {} -> {} ({})",
        analysis
            .latest_tag
            .version()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string()),
        version,
        if analysis.latest_tag.is_first_release() {
            "first release".to_string()
        } else {
            format!("{} bump", analysis.bump)
        }
    );

    if tag_exists(repo, &tag)? {
        return Err(ReleaseError::TagAlreadyExists(tag));
    }

    // ── Stage 3: Changelog contents ──
    let current = ReleaseNotes::from_commits(version.clone(), today, &analysis.commits);
    let releases = collect_release_notes(repo, config, current)?;
    let changelog_path = resolve_changelog_path(workdir, &config.changelog);

    if config.dry_run {
        print_dry_run(config, &version_files, &version, &tag, &releases);
        return Ok(ReleaseOutcome::DryRun { version, tag });
    }

    // ── Stage 4: Write manifests and changelog ──
    for vf in &version_files {
        update_version_file(vf, &version)?;
        println!(
            "  [DONE] Updated {}: {} -> {}",
            vf.kind, vf.current_version, version
        );
    }

    let update = if config.release_count == 0 {
        replace_changelog(&changelog_path, &releases)?
    } else {
        prepend_releases(&changelog_path, &releases)?
    };
    match update {
        ChangelogUpdate::Prepended { sections } => println!(
            "  [DONE] Added {} section(s) to {}",
            sections,
            changelog_path.display()
        ),
        ChangelogUpdate::Replaced { sections } => println!(
            "  [DONE] Rewrote {} with {} section(s)",
            changelog_path.display(),
            sections
        ),
        ChangelogUpdate::Unchanged => println!(
            "  [SKIP] {} already has a section for {}",
            changelog_path.display(),
            version
        ),
    }

    // ── Stage 5: Pre-commit script ──
    let version_str = version.to_string();
    if let Some(command) = &config.pre_commit {
        executor.run_script(ScriptHook::PreCommit, command, &version_str)?;
        println!("  [DONE] Ran pre-commit script");
    }

    // ── Stage 6: Commit, tag, push ──
    let mut files_to_stage: Vec<PathBuf> = version_files.iter().map(|vf| vf.path.clone()).collect();
    files_to_stage.push(changelog_path);

    let commit_message = release_commit_message(&tag);
    executor.stage(&files_to_stage)?;
    executor.commit(&commit_message)?;
    println!("  [DONE] Created commit: {}", commit_message);
    executor.tag(&tag)?;
    println!("  [DONE] Created tag: {}", tag);

    if let Err(e) = executor.push() {
        eprintln!("  [FAIL] {}", e);
        eprintln!("Rolling back...");
        match executor.rollback(&tag) {
            Ok(()) => {
                eprintln!("  [DONE] Deleted tag {} and reset commit", tag);
                eprintln!("Release aborted. Fix the push issue and try again.");
            }
            Err(rollback_err) => {
                eprintln!("  [FAIL] Rollback failed: {}", rollback_err);
                eprintln!(
                    "Manual cleanup may be needed: git tag -d {} && git reset --soft HEAD~1",
                    tag
                );
            }
        }
        return Err(e);
    }
    println!("  [DONE] Pushed commit and tags");

    // ── Stage 7: Post-success script ──
    if let Some(command) = &config.post_success {
        executor.run_script(ScriptHook::PostSuccess, command, &version_str)?;
        println!("  [DONE] Ran post-success script");
    }

    println!();
    println!("Release {} shipped!", tag);
    Ok(ReleaseOutcome::Released { version, tag })
}

/// Commit message for the release commit.
pub fn release_commit_message(tag: &str) -> String {
    format!("chore(release): {}", tag)
}

/// Sections to write, newest first: the new release, then as many
/// earlier tagged releases as `release_count` asks for (all when 0).
fn collect_release_notes(
    repo: &Repository,
    config: &ReleaseConfig,
    current: ReleaseNotes,
) -> Result<Vec<ReleaseNotes>, ReleaseError> {
    let previous_wanted = match config.release_count {
        0 => usize::MAX,
        n => (n as usize).saturating_sub(1),
    };

    let mut releases = vec![current];
    if previous_wanted == 0 {
        return Ok(releases);
    }

    for range in release_ranges(repo, &config.tag_prefix)?
        .into_iter()
        .take(previous_wanted)
    {
        let commits = parse_commits(&range.commits(repo)?);
        let date = range.date(repo)?;
        releases.push(ReleaseNotes::from_commits(range.version, date, &commits));
    }

    Ok(releases)
}

fn print_dry_run(
    config: &ReleaseConfig,
    version_files: &[VersionFile],
    version: &Version,
    tag: &str,
    releases: &[ReleaseNotes],
) {
    println!();
    println!("Version files:");
    for vf in version_files {
        println!("  [UPDATE] {}: {} -> {}", vf.kind, vf.current_version, version);
    }

    println!();
    println!("Changelog contents would have been:");
    println!();
    for notes in releases {
        print!("{}", notes.render());
    }

    println!("Summary:");
    if let Some(command) = &config.pre_commit {
        println!("  Pre-commit:   {} (skipped)", command);
    }
    println!("  Commit:       {}", release_commit_message(tag));
    println!("  Tag:          {}", tag);
    println!("  Push:         skipped");
    if let Some(command) = &config.post_success {
        println!("  Post-success: {} (skipped)", command);
    }
    println!();
    println!("Dry run complete. No changes made.");
}

fn resolve_changelog_path(root: &Path, output: &Path) -> PathBuf {
    if output.is_absolute() {
        output.to_path_buf()
    } else {
        root.join(output)
    }
}

#[cfg(test)]
mod tests {
    use git2::{IndexAddOption, Oid, Signature};
    use mockall::Sequence;
    use tempfile::TempDir;

    use super::executor::MockReleaseExecutor;
    use super::gate::SkipDetail;
    use super::*;

    const CARGO_TOML: &str = "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n";

    fn init_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), CARGO_TOML).unwrap();
        (dir, repo)
    }

    fn commit_all(repo: &Repository, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn any_branch() -> ReleaseConfig {
        ReleaseConfig {
            branch: "*".to_string(),
            ..ReleaseConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_first_release_runs_steps_in_order() {
        let (dir, repo) = init_repo();
        commit_all(&repo, "feat(api): add endpoint");

        let mut seq = Sequence::new();
        let mut executor = MockReleaseExecutor::new();
        executor
            .expect_stage()
            .withf(|files: &[PathBuf]| files.len() == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        executor
            .expect_commit()
            .withf(|message: &str| message == "chore(release): v1.0.0")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        executor
            .expect_tag()
            .withf(|name: &str| name == "v1.0.0")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        executor
            .expect_push()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        executor.expect_rollback().never();

        let outcome =
            execute_release(&repo, dir.path(), &any_branch(), &executor, today()).unwrap();
        assert_eq!(
            outcome,
            ReleaseOutcome::Released {
                version: Version::new(1, 0, 0),
                tag: "v1.0.0".to_string()
            }
        );

        let manifest = std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
        assert!(manifest.contains("version = \"1.0.0\""));
        let changelog = std::fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.contains("## 1.0.0 (2024-03-01)"));
        assert!(changelog.contains("* **api:** add endpoint"));
    }

    #[test]
    fn test_push_failure_rolls_back() {
        let (dir, repo) = init_repo();
        commit_all(&repo, "fix: handle empty input");

        let mut executor = MockReleaseExecutor::new();
        executor.expect_stage().returning(|_| Ok(()));
        executor.expect_commit().returning(|_| Ok(()));
        executor.expect_tag().returning(|_| Ok(()));
        executor
            .expect_push()
            .returning(|| Err(ReleaseError::PushFailed("rejected".into())));
        executor
            .expect_rollback()
            .withf(|tag: &str| tag == "v1.0.0")
            .times(1)
            .returning(|_| Ok(()));
        executor.expect_run_script().never();

        let config = ReleaseConfig {
            post_success: Some("echo published".to_string()),
            ..any_branch()
        };
        let result = execute_release(&repo, dir.path(), &config, &executor, today());
        assert!(matches!(result, Err(ReleaseError::PushFailed(_))));
    }

    #[test]
    fn test_scripts_wrap_commit() {
        let (dir, repo) = init_repo();
        commit_all(&repo, "feat: new thing");

        let mut seq = Sequence::new();
        let mut executor = MockReleaseExecutor::new();
        executor
            .expect_run_script()
            .withf(|hook, command, version| {
                *hook == ScriptHook::PreCommit && command == "make dist" && version == "1.0.0"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        executor
            .expect_stage()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        executor
            .expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        executor
            .expect_tag()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        executor
            .expect_push()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        executor
            .expect_run_script()
            .withf(|hook, _, _| *hook == ScriptHook::PostSuccess)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let config = ReleaseConfig {
            pre_commit: Some("make dist".to_string()),
            post_success: Some("cargo publish".to_string()),
            ..any_branch()
        };
        execute_release(&repo, dir.path(), &config, &executor, today()).unwrap();
    }

    #[test]
    fn test_no_qualifying_commits_skips() {
        let (dir, repo) = init_repo();
        let oid = commit_all(&repo, "feat: first");
        let obj = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight("v1.0.0", &obj, false).unwrap();
        commit_all(&repo, "docs: readme");
        commit_all(&repo, "chore: tidy");

        // No expectations: any side effect panics.
        let executor = MockReleaseExecutor::new();
        let outcome =
            execute_release(&repo, dir.path(), &any_branch(), &executor, today()).unwrap();

        match outcome {
            ReleaseOutcome::Skipped(reason) => {
                assert_eq!(reason.latest_tag, "v1.0.0..HEAD");
                assert_eq!(reason.detail, SkipDetail::RerunVerboseHint);
            }
            other => panic!("expected skip, got {:?}", other),
        }
        let manifest = std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
        assert_eq!(manifest, CARGO_TOML);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (dir, repo) = init_repo();
        let oid = commit_all(&repo, "feat: first");
        let obj = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight("v1.0.0", &obj, false).unwrap();
        commit_all(&repo, "fix: second");

        let executor = MockReleaseExecutor::new();
        let config = ReleaseConfig {
            dry_run: true,
            ..any_branch()
        };
        let outcome = execute_release(&repo, dir.path(), &config, &executor, today()).unwrap();

        assert_eq!(
            outcome,
            ReleaseOutcome::DryRun {
                version: Version::new(1, 0, 1),
                tag: "v1.0.1".to_string()
            }
        );
        assert!(!dir.path().join("CHANGELOG.md").exists());
        let manifest = std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
        assert_eq!(manifest, CARGO_TOML);
    }

    #[test]
    fn test_wrong_branch_fails_before_git_steps() {
        let (dir, repo) = init_repo();
        commit_all(&repo, "feat: first");

        let executor = MockReleaseExecutor::new();
        let config = ReleaseConfig {
            branch: "release-only".to_string(),
            ..ReleaseConfig::default()
        };
        let result = execute_release(&repo, dir.path(), &config, &executor, today());
        assert!(matches!(result, Err(ReleaseError::WrongBranch { .. })));
    }

    #[test]
    fn test_release_count_collects_previous_sections() {
        let (_dir, repo) = init_repo();
        let first = commit_all(&repo, "feat: one");
        let obj = repo.find_object(first, None).unwrap();
        repo.tag_lightweight("v1.0.0", &obj, false).unwrap();
        let second = commit_all(&repo, "fix: two");
        let obj = repo.find_object(second, None).unwrap();
        repo.tag_lightweight("v1.0.1", &obj, false).unwrap();

        let current = ReleaseNotes::from_commits(Version::new(1, 1, 0), today(), &[]);

        let config = ReleaseConfig {
            release_count: 2,
            ..any_branch()
        };
        let notes = collect_release_notes(&repo, &config, current.clone()).unwrap();
        let versions: Vec<String> = notes.iter().map(|n| n.version.to_string()).collect();
        assert_eq!(versions, vec!["1.1.0", "1.0.1"]);

        let config = ReleaseConfig {
            release_count: 0,
            ..any_branch()
        };
        let notes = collect_release_notes(&repo, &config, current).unwrap();
        assert_eq!(notes.len(), 3);
    }
}
