//! Release configuration.
//!
//! Values come from an optional `.semrel.toml` at the repository root and
//! are overridden by command-line flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Default config file name, looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = ".semrel.toml";

const DEFAULT_BRANCH: &str = "master";
const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_release_count() -> u32 {
    1
}

fn default_changelog() -> PathBuf {
    PathBuf::from(DEFAULT_CHANGELOG)
}

/// Contents of `.semrel.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Branch allowed to release; `*` allows any.
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default)]
    pub tag_prefix: String,

    /// Number of releases rendered into the changelog; 0 regenerates it all.
    #[serde(default = "default_release_count")]
    pub release_count: u32,

    #[serde(default = "default_changelog")]
    pub changelog: PathBuf,

    #[serde(default)]
    pub pre_commit: Option<String>,

    #[serde(default)]
    pub post_success: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            tag_prefix: String::new(),
            release_count: default_release_count(),
            changelog: default_changelog(),
            pre_commit: None,
            post_success: None,
        }
    }
}

impl FileConfig {
    /// Parse a config file from TOML text.
    pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(path, &content)?;
        debug!(path = %path.display(), ?config, "Loaded config file");
        Ok(config)
    }
}

/// Fully resolved settings for one release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub dry_run: bool,
    pub verbose: bool,
    pub branch: String,
    pub tag_prefix: String,
    pub release_count: u32,
    pub changelog: PathBuf,
    pub pre_commit: Option<String>,
    pub post_success: Option<String>,
    /// Replace `git push` with this exit code.
    pub mock_push: Option<i32>,
}

/// Flag values that override the config file when present.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dry_run: bool,
    pub verbose: bool,
    pub branch: Option<String>,
    pub tag_prefix: Option<String>,
    pub release_count: Option<u32>,
    pub changelog: Option<PathBuf>,
    pub pre_commit: Option<String>,
    pub post_success: Option<String>,
    pub mock_push: Option<i32>,
}

impl ReleaseConfig {
    pub fn resolve(file: FileConfig, overrides: ConfigOverrides) -> Self {
        Self {
            dry_run: overrides.dry_run,
            verbose: overrides.verbose,
            branch: overrides.branch.unwrap_or(file.branch),
            tag_prefix: overrides.tag_prefix.unwrap_or(file.tag_prefix),
            release_count: overrides.release_count.unwrap_or(file.release_count),
            changelog: overrides.changelog.unwrap_or(file.changelog),
            pre_commit: overrides.pre_commit.or(file.pre_commit),
            post_success: overrides.post_success.or(file.post_success),
            mock_push: overrides.mock_push,
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self::resolve(FileConfig::default(), ConfigOverrides::default())
    }
}
