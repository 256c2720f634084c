use std::str::FromStr;

use crate::error::PackageError;

/// Repository identity derived from the last two path segments of a source URL.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl RepoId {
    /// `url` without surrounding whitespace, trailing slashes or a `.git` suffix,
    /// so spellings of the same repository compare equal.
    pub fn canonical_url(url: &str) -> &str {
        let trimmed = url.trim().trim_end_matches('/');
        trimmed.strip_suffix(".git").unwrap_or(trimmed)
    }

    /// Parse `https://github.com/<owner>/<name>` (a trailing slash or `.git` is tolerated).
    pub fn from_url(url: &str) -> Result<Self, PackageError> {
        let trimmed = Self::canonical_url(url);

        let mut segments = trimmed.rsplit('/');
        let name = segments.next().unwrap_or_default();
        let owner = segments.next().unwrap_or_default();

        // Need at least a host (or scheme) segment before owner/name
        if name.is_empty() || owner.is_empty() || owner.contains(':') || segments.next().is_none()
        {
            return Err(PackageError::InvalidUrl(url.to_string()));
        }

        Ok(RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl FromStr for RepoId {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoId::from_url(s)
    }
}
