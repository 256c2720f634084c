//! Manifest Store: the per-install record written next to every artifact.
//!
//! Manifests are YAML. Files in the older one-line `URL VERSION TYPE` format
//! (`unhacs.txt`, `<file>-unhacs.txt`) are still readable; they are never written.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::PackageError;
use crate::runtime::Runtime;

use super::model::{Package, PackageKind, PackageType};

/// Persisted fields of a [`Package`]. Shared by manifests and lock entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub url: String,
    pub version: String,
    #[serde(default = "default_package_type")]
    pub package_type: PackageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub ignored_versions: BTreeSet<String>,
}

fn default_package_type() -> PackageType {
    PackageType::Integration
}

impl From<&Package> for PackageRecord {
    fn from(package: &Package) -> Self {
        let (fork_component, branch_name) = match &package.kind {
            PackageKind::Fork {
                fork_component,
                branch_name,
            } => (Some(fork_component.clone()), Some(branch_name.clone())),
            _ => (None, None),
        };

        PackageRecord {
            url: package.url.clone(),
            version: package.version.clone(),
            package_type: package.package_type(),
            fork_component,
            branch_name,
            ignored_versions: package.ignored_versions.clone(),
        }
    }
}

impl TryFrom<PackageRecord> for Package {
    type Error = PackageError;

    fn try_from(record: PackageRecord) -> Result<Self, Self::Error> {
        let kind = match record.package_type {
            PackageType::Integration => PackageKind::Integration,
            PackageType::Plugin => PackageKind::Plugin,
            PackageType::Theme => PackageKind::Theme,
            PackageType::Fork => match (record.fork_component, record.branch_name) {
                (Some(fork_component), Some(branch_name)) => PackageKind::Fork {
                    fork_component,
                    branch_name,
                },
                _ => {
                    return Err(PackageError::InvalidManifest(format!(
                        "fork {} is missing fork_component or branch_name",
                        record.url
                    )));
                }
            },
        };

        Ok(Package::new(&record.url, &record.version, kind)?
            .with_ignored_versions(record.ignored_versions))
    }
}

impl PackageRecord {
    /// Parse one `URL VERSION TYPE` line of the legacy plain-text format.
    pub fn from_legacy_line(line: &str) -> Result<Self, PackageError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [url, version, rest @ ..] = fields.as_slice() else {
            return Err(PackageError::InvalidManifest(format!(
                "expected 'URL VERSION TYPE', got '{}'",
                line.trim()
            )));
        };

        Ok(PackageRecord {
            url: url.to_string(),
            version: version.to_string(),
            package_type: rest
                .first()
                .map(|t| PackageType::parse_lenient(t))
                .unwrap_or(PackageType::Integration),
            fork_component: rest.get(1).map(|s| s.to_string()),
            branch_name: rest.get(2).map(|s| s.to_string()),
            ignored_versions: BTreeSet::new(),
        })
    }
}

pub fn is_legacy(location: &Path) -> bool {
    location.extension().is_some_and(|ext| ext == "txt")
}

/// Write `contents` next to `location` first, then move it into place, so a
/// reader never sees a half-written file.
pub(crate) fn write_replacing(runtime: &dyn Runtime, location: &Path, contents: &str) -> Result<()> {
    let mut staged = location.as_os_str().to_os_string();
    staged.push(".tmp");
    let staged = Path::new(&staged);

    runtime
        .write(staged, contents.as_bytes())
        .with_context(|| format!("Failed to write {:?}", staged))?;
    runtime
        .rename(staged, location)
        .with_context(|| format!("Failed to move manifest into place at {:?}", location))
}

/// Serialize the persisted fields of `package` to `location`.
#[tracing::instrument(skip(runtime, package))]
pub fn write(runtime: &dyn Runtime, package: &Package, location: &Path) -> Result<()> {
    // Serialize fully before touching the disk
    let contents = serde_yaml::to_string(&PackageRecord::from(package))
        .context("Failed to serialize manifest")?;
    debug!("Writing manifest for {} to {:?}", package, location);
    write_replacing(runtime, location, &contents)
}

/// Read the package recorded at `location`. `path` is left unset.
#[tracing::instrument(skip(runtime))]
pub fn read(runtime: &dyn Runtime, location: &Path) -> Result<Package> {
    let contents = runtime
        .read_to_string(location)
        .with_context(|| format!("Failed to read manifest {:?}", location))?;

    let record = if is_legacy(location) {
        PackageRecord::from_legacy_line(&contents)?
    } else {
        serde_yaml::from_str(&contents)
            .map_err(|e| PackageError::InvalidManifest(format!("{:?}: {}", location, e)))?
    };

    Ok(Package::try_from(record)?)
}
