//! Package manifest detection and version update.
//!
//! Supports Cargo.toml (package or workspace package), package.json and
//! pyproject.toml (PEP 621 + Poetry).

use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use toml_edit::DocumentMut;
use tracing::debug;

use crate::error::ReleaseError;

/// The kind of manifest detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFileKind {
    CargoToml,
    PackageJson,
    PyprojectToml,
}

impl VersionFileKind {
    pub const ALL: [Self; 3] = [Self::CargoToml, Self::PackageJson, Self::PyprojectToml];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::CargoToml => "Cargo.toml",
            Self::PackageJson => "package.json",
            Self::PyprojectToml => "pyproject.toml",
        }
    }

    /// TOML key paths that may hold the version, in lookup order.
    fn toml_version_keys(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::CargoToml => &[&["package", "version"], &["workspace", "package", "version"]],
            Self::PyprojectToml => &[&["project", "version"], &["tool", "poetry", "version"]],
            Self::PackageJson => &[],
        }
    }
}

impl fmt::Display for VersionFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A detected manifest with its current version.
#[derive(Debug, Clone)]
pub struct VersionFile {
    pub path: PathBuf,
    pub kind: VersionFileKind,
    pub current_version: Version,
}

/// Detect manifests carrying a semver version in the project root.
///
/// Returns `ReleaseError::NoVersionFiles` if none is found.
pub fn detect_version_files(root: &Path) -> Result<Vec<VersionFile>, ReleaseError> {
    let mut files = Vec::new();

    for kind in VersionFileKind::ALL {
        let path = root.join(kind.file_name());
        if !path.exists() {
            continue;
        }

        let version = match kind {
            VersionFileKind::PackageJson => read_package_json_version(&path)?,
            _ => read_toml_version(&path, kind)?,
        };

        match version {
            Some(current_version) => files.push(VersionFile {
                path,
                kind,
                current_version,
            }),
            None => debug!(file = %kind, "Manifest has no semver version, skipping"),
        }
    }

    if files.is_empty() {
        return Err(ReleaseError::NoVersionFiles);
    }

    Ok(files)
}

/// Update a manifest to the new version.
pub fn update_version_file(file: &VersionFile, new_version: &Version) -> Result<(), ReleaseError> {
    match file.kind {
        VersionFileKind::PackageJson => update_package_json(&file.path, new_version),
        kind => update_toml_version(&file.path, kind, new_version),
    }
}

// --- TOML manifests ---

fn read_toml_version(path: &Path, kind: VersionFileKind) -> Result<Option<Version>, ReleaseError> {
    let content = read_file(path)?;
    let doc = parse_toml(path, &content)?;

    let version = kind
        .toml_version_keys()
        .iter()
        .find_map(|keys| toml_lookup(&doc, keys))
        .and_then(|s| Version::parse(s).ok());

    Ok(version)
}

fn update_toml_version(
    path: &Path,
    kind: VersionFileKind,
    new_version: &Version,
) -> Result<(), ReleaseError> {
    let content = read_file(path)?;
    let mut doc = parse_toml(path, &content)?;

    let keys = kind
        .toml_version_keys()
        .iter()
        .find(|keys| toml_lookup(&doc, keys).is_some())
        .ok_or_else(|| ReleaseError::VersionFileUpdateFailed {
            path: path.to_path_buf(),
            reason: "No version field found".into(),
        })?;

    let mut item = doc.as_item_mut();
    for key in keys.iter() {
        item = &mut item[*key];
    }
    *item = toml_edit::value(new_version.to_string());

    write_file(path, &doc.to_string())
}

fn toml_lookup<'a>(doc: &'a DocumentMut, keys: &[&str]) -> Option<&'a str> {
    let mut item = doc.as_item();
    for key in keys {
        item = item.get(*key)?;
    }
    item.as_str()
}

fn parse_toml(path: &Path, content: &str) -> Result<DocumentMut, ReleaseError> {
    content
        .parse::<DocumentMut>()
        .map_err(|e| ReleaseError::VersionFileUpdateFailed {
            path: path.to_path_buf(),
            reason: format!("Invalid TOML: {}", e),
        })
}

// --- package.json ---

fn read_package_json(path: &Path) -> Result<serde_json::Value, ReleaseError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| ReleaseError::VersionFileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Invalid JSON: {}", e),
    })
}

fn read_package_json_version(path: &Path) -> Result<Option<Version>, ReleaseError> {
    let json = read_package_json(path)?;
    Ok(json
        .get("version")
        .and_then(|v| v.as_str())
        .and_then(|s| Version::parse(s).ok()))
}

fn update_package_json(path: &Path, new_version: &Version) -> Result<(), ReleaseError> {
    let mut json = read_package_json(path)?;

    json["version"] = serde_json::Value::String(new_version.to_string());

    let output =
        serde_json::to_string_pretty(&json).map_err(|e| ReleaseError::VersionFileUpdateFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to serialize JSON: {}", e),
        })?;

    // npm uses trailing newline
    write_file(path, &format!("{}\n", output))
}

// --- Shared helpers ---

fn read_file(path: &Path) -> Result<String, ReleaseError> {
    std::fs::read_to_string(path).map_err(|e| ReleaseError::VersionFileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to read: {}", e),
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), ReleaseError> {
    std::fs::write(path, content).map_err(|e| ReleaseError::VersionFileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to write: {}", e),
    })
}
