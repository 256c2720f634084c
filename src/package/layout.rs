use std::path::{Path, PathBuf};

use super::model::PackageType;

pub const INTEGRATIONS_DIR: &str = "custom_components";
pub const PLUGINS_DIR: &str = "www/js";
pub const THEMES_DIR: &str = "themes";

/// Manifest inside an integration/fork directory.
pub const MANIFEST_FILE: &str = "unhacs.yaml";
/// Suffix appended to a plugin/theme file name for its sibling manifest.
pub const MANIFEST_SUFFIX: &str = "-unhacs.yaml";
pub const LEGACY_MANIFEST_FILE: &str = "unhacs.txt";
pub const LEGACY_MANIFEST_SUFFIX: &str = "-unhacs.txt";

pub const DEFAULT_LOCK_FILE: &str = "unhacs.yaml";

/// Prefix of the scoped extraction workspaces created inside the root.
pub const WORKSPACE_PREFIX: &str = ".unhacs-";

/// Directory conventions under one configuration root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn integrations_dir(&self) -> PathBuf {
        self.root.join(INTEGRATIONS_DIR)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(PLUGINS_DIR)
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.root.join(THEMES_DIR)
    }

    /// Folder a variant installs into. Integrations and forks get a subdirectory of it.
    pub fn dir_for(&self, package_type: PackageType) -> PathBuf {
        match package_type {
            PackageType::Integration | PackageType::Fork => self.integrations_dir(),
            PackageType::Plugin => self.plugins_dir(),
            PackageType::Theme => self.themes_dir(),
        }
    }

    /// Manifest location for an installed artifact (directory or single file).
    pub fn manifest_for(artifact: &Path, is_dir: bool) -> PathBuf {
        let [current, _legacy] = Self::manifest_candidates(artifact, is_dir);
        current
    }

    /// Manifest files that may accompany an artifact, current format first.
    pub fn manifest_candidates(artifact: &Path, is_dir: bool) -> [PathBuf; 2] {
        if is_dir {
            return [
                artifact.join(MANIFEST_FILE),
                artifact.join(LEGACY_MANIFEST_FILE),
            ];
        }
        let name = artifact.file_name().unwrap_or_default().to_string_lossy();
        [
            artifact.with_file_name(format!("{}{}", name, MANIFEST_SUFFIX)),
            artifact.with_file_name(format!("{}{}", name, LEGACY_MANIFEST_SUFFIX)),
        ]
    }

    /// The artifact a suffixed manifest file belongs to, if `manifest` is one.
    pub fn artifact_for_manifest(manifest: &Path) -> Option<PathBuf> {
        let name = manifest.file_name()?.to_str()?;
        let artifact = name
            .strip_suffix(MANIFEST_SUFFIX)
            .or_else(|| name.strip_suffix(LEGACY_MANIFEST_SUFFIX))
            .filter(|artifact| !artifact.is_empty())?;
        Some(manifest.with_file_name(artifact))
    }
}
