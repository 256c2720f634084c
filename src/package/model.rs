use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::error::PackageError;
use crate::github::RepoId;

use super::resolver::Resolution;

/// Persisted variant tag.
///
/// Deserialization is lenient: any value that is not a known tag reads as
/// [`PackageType::Integration`] so older manifests stay readable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PackageType {
    Integration,
    Plugin,
    Theme,
    Fork,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Integration => "integration",
            PackageType::Plugin => "plugin",
            PackageType::Theme => "theme",
            PackageType::Fork => "fork",
        }
    }

    /// Map a persisted tag onto a variant, degrading unknown values to `Integration`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "plugin" => PackageType::Plugin,
            "theme" => PackageType::Theme,
            "fork" => PackageType::Fork,
            _ => PackageType::Integration,
        }
    }
}

impl From<String> for PackageType {
    fn from(value: String) -> Self {
        PackageType::parse_lenient(&value)
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of package variants, with the fields only forks carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageKind {
    Integration,
    Plugin,
    Theme,
    Fork {
        fork_component: String,
        branch_name: String,
    },
}

impl PackageKind {
    pub fn package_type(&self) -> PackageType {
        match self {
            PackageKind::Integration => PackageType::Integration,
            PackageKind::Plugin => PackageType::Plugin,
            PackageKind::Theme => PackageType::Theme,
            PackageKind::Fork { .. } => PackageType::Fork,
        }
    }
}

/// An add-on identified by its source repository and pinned version.
///
/// Equality only considers `url` and `version`.
#[derive(Debug, Clone)]
pub struct Package {
    pub url: String,
    pub owner: String,
    pub name: String,
    /// Release tag, or commit SHA for forks.
    pub version: String,
    pub kind: PackageKind,
    /// Release tags skipped when picking the latest release.
    pub ignored_versions: BTreeSet<String>,
    /// Artifact location, set only when discovered on disk. Never persisted.
    pub path: Option<PathBuf>,
    pub(crate) resolution: Option<Resolution>,
}

impl Package {
    /// Build a fully specified package (from a lock entry or manifest). No network access.
    ///
    /// The url is stored in canonical form; see [`RepoId::canonical_url`].
    pub fn new(url: &str, version: &str, kind: PackageKind) -> Result<Self, PackageError> {
        let repo = RepoId::from_url(url)?;
        Ok(Self {
            url: RepoId::canonical_url(url).to_string(),
            owner: repo.owner,
            name: repo.name,
            version: version.to_string(),
            kind,
            ignored_versions: BTreeSet::new(),
            path: None,
            resolution: None,
        })
    }

    pub fn repo(&self) -> RepoId {
        RepoId {
            owner: self.owner.clone(),
            name: self.name.clone(),
        }
    }

    pub fn package_type(&self) -> PackageType {
        self.kind.package_type()
    }

    pub fn with_ignored_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_versions = versions
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.trim().is_empty())
            .collect();
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Whether `selector` names this package, either by repository name or by url.
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        self.name == selector
            || self.url == selector
            || RepoId::from_url(selector).is_ok_and(|repo| repo == self.repo())
    }

    /// `name version (url)` style line with the variant tag in front.
    pub fn verbose(&self) -> String {
        format!("{}: {} ({})", self.package_type(), self, self.url)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.version == other.version
    }
}

impl Eq for Package {}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PackageKind::Fork {
                fork_component,
                branch_name,
            } => write!(
                f,
                "{} ({}/{}@{}) {}",
                fork_component, self.owner, self.name, branch_name, self.version
            ),
            _ => write!(f, "{} {}", self.name, self.version),
        }
    }
}
