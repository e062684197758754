//! semrel - CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use git2::Repository;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use semrel::config::{CONFIG_FILE_NAME, ConfigOverrides, FileConfig, ReleaseConfig};
use semrel::release::{ReleaseOutcome, run_release};

/// Fully automated semantic releases from conventional commits.
#[derive(Parser, Debug)]
#[command(name = "semrel")]
#[command(about = "Bump, tag and publish a release from conventional commits")]
#[command(version)]
struct Cli {
    /// Show what would be released without writing, committing or pushing
    #[arg(long)]
    dry_run: bool,

    /// Command to run before the release commit; the version is appended
    #[arg(long, value_name = "CMD")]
    pre_commit: Option<String>,

    /// Command to run after a successful push
    #[arg(long, value_name = "CMD")]
    post_success: Option<String>,

    /// Branch allowed to release from ('*' for any) [default: master]
    #[arg(short = 'b', long, value_name = "NAME")]
    branch: Option<String>,

    /// List the commits when no release is necessary, and log at debug level
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Changelog layout
    #[arg(long, value_enum, default_value_t = ChangelogPreset::Angular)]
    changelog_preset: ChangelogPreset,

    /// Releases to render into the changelog; 0 regenerates the whole file [default: 1]
    #[arg(short = 'r', long, value_name = "N")]
    release_count: Option<u32>,

    /// Skip `git push` and act as if it exited with this code
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    mock_push: Option<i32>,

    /// Prefix in front of `v<version>` in tag names
    #[arg(long, value_name = "PREFIX")]
    tag_prefix: Option<String>,

    /// Path to the config file [default: <repo root>/.semrel.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChangelogPreset {
    /// feat / fix / perf sections plus breaking changes
    Angular,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = real_main(cli) {
        error!("{:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn real_main(cli: Cli) -> Result<()> {
    debug!(preset = ?cli.changelog_preset, "Changelog preset");

    let file_config = load_file_config(cli.config.as_deref())?;
    let config = ReleaseConfig::resolve(
        file_config,
        ConfigOverrides {
            dry_run: cli.dry_run,
            verbose: cli.verbose,
            branch: cli.branch,
            tag_prefix: cli.tag_prefix,
            release_count: cli.release_count,
            changelog: None,
            pre_commit: cli.pre_commit,
            post_success: cli.post_success,
            mock_push: cli.mock_push,
        },
    );
    debug!(?config, "Resolved configuration");

    match run_release(&config).context("Release failed")? {
        ReleaseOutcome::Skipped(_) => debug!("No release necessary"),
        ReleaseOutcome::DryRun { tag, .. } => debug!(%tag, "Dry run finished"),
        ReleaseOutcome::Released { tag, .. } => debug!(%tag, "Released"),
    }

    Ok(())
}

/// An explicit `--config` must exist; the default location is optional.
fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file {} does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => default_config_path(),
    };

    FileConfig::load(&path).context("Failed to load configuration")
}

fn default_config_path() -> PathBuf {
    Repository::discover(".")
        .ok()
        .and_then(|repo| repo.workdir().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}
