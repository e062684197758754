//! Error types for semrel modules using thiserror.
//!
//! The parse/classify/gate core has no error type: a commit that does not
//! qualify is not a failure. Everything here belongs to the orchestration
//! around it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Commit {hash} has invalid timestamp (seconds={seconds})")]
    InvalidTimestamp { hash: String, seconds: i64 },
}

/// Errors from changelog operations.
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Failed to read changelog: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write changelog: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to create backup: {0}")]
    BackupFailed(#[source] std::io::Error),
}

/// Errors from loading `.semrel.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from the release pipeline.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    #[error("git is required but was not found in PATH")]
    GitNotInstalled,

    #[error("Git operation failed: {0}")]
    GitFailed(String),

    #[error(
        "You can not release from branch '{current}'. Allowed branch is '{allowed}'. \
         Use --branch to specify the branch name, or --branch '*' to allow any branch."
    )]
    WrongBranch { current: String, allowed: String },

    #[error("HEAD is detached. Check out the release branch or use --branch '*'.")]
    DetachedHead,

    #[error(
        "No package manifest found. Expected one of Cargo.toml, package.json or pyproject.toml \
         with a version field."
    )]
    NoVersionFiles,

    #[error("Failed to update {path}: {reason}")]
    VersionFileUpdateFailed { path: PathBuf, reason: String },

    #[error("Tag {0} already exists")]
    TagAlreadyExists(String),

    #[error("Failed to spawn {name} script: {source}")]
    ScriptSpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} script `{command}` exited with {}", code.map_or("a signal".to_string(), |c| format!("code {c}")))]
    ScriptFailed {
        name: String,
        command: String,
        code: Option<i32>,
    },

    #[error("Push failed: {0}")]
    PushFailed(String),
}
