//! User-configured scripts around the release commit.
//!
//! Scripts run through the platform shell from the repository root. The
//! new version is passed as a trailing argument to the pre-commit script
//! and exported to both as `SEMREL_VERSION`.

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::ReleaseError;

/// Environment variable holding the version being released.
pub const VERSION_ENV_VAR: &str = "SEMREL_VERSION";

/// When a script runs relative to the release steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptHook {
    /// After the manifest and changelog are written, before the commit.
    PreCommit,
    /// After the push succeeded.
    PostSuccess,
}

impl ScriptHook {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreCommit => "pre-commit",
            Self::PostSuccess => "post-success",
        }
    }

    /// Full command line for this hook.
    pub fn command_line(self, command: &str, version: &str) -> String {
        match self {
            Self::PreCommit => format!("{} {}", command, version),
            Self::PostSuccess => command.to_string(),
        }
    }
}

/// Run a hook script and fail on a non-zero exit status.
pub fn run_script(
    hook: ScriptHook,
    command: &str,
    version: &str,
    workdir: &Path,
) -> Result<(), ReleaseError> {
    let command_line = hook.command_line(command, version);
    info!(hook = hook.as_str(), command = %command_line, "Running script");

    let status = shell(&command_line)
        .current_dir(workdir)
        .env(VERSION_ENV_VAR, version)
        .status()
        .map_err(|source| ReleaseError::ScriptSpawnFailed {
            name: hook.as_str().to_string(),
            source,
        })?;

    if !status.success() {
        return Err(ReleaseError::ScriptFailed {
            name: hook.as_str().to_string(),
            command: command_line,
            code: status.code(),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

#[cfg(windows)]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}
