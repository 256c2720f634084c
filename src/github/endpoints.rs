use super::RepoId;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Base URLs of the source host and the URL shapes built from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub raw_url: String,
    pub web_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Build endpoints, falling back to the public GitHub hosts for anything not given.
    pub fn new(api_url: Option<String>, raw_url: Option<String>, web_url: Option<String>) -> Self {
        let defaults = Self::default();
        let clean = |url: String| url.trim_end_matches('/').to_string();
        Self {
            api_url: api_url.map(clean).unwrap_or(defaults.api_url),
            raw_url: raw_url.map(clean).unwrap_or(defaults.raw_url),
            web_url: web_url.map(clean).unwrap_or(defaults.web_url),
        }
    }

    /// Point every endpoint at one base URL (used against mock servers).
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            api_url: base.clone(),
            raw_url: base.clone(),
            web_url: base,
        }
    }

    pub fn releases_url(&self, repo: &RepoId) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.name)
    }

    pub fn branch_url(&self, repo: &RepoId, branch: &str) -> String {
        format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_url, repo.owner, repo.name, branch
        )
    }

    pub fn raw_file_url(&self, repo: &RepoId, git_ref: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_url, repo.owner, repo.name, git_ref, path
        )
    }

    pub fn release_asset_url(&self, repo: &RepoId, tag: &str, file: &str) -> String {
        format!(
            "{}/{}/{}/releases/download/{}/{}",
            self.web_url, repo.owner, repo.name, tag, file
        )
    }

    pub fn tag_archive_url(&self, repo: &RepoId, tag: &str) -> String {
        format!(
            "{}/{}/{}/archive/refs/tags/{}.zip",
            self.web_url, repo.owner, repo.name, tag
        )
    }

    pub fn branch_archive_url(&self, repo: &RepoId, branch: &str) -> String {
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            self.web_url, repo.owner, repo.name, branch
        )
    }
}
