use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use crate::http::HttpClient;

use super::endpoints::Endpoints;
use super::repo::RepoId;
use super::types::{Branch, Release};

/// Everything the package lifecycle needs from the source host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    fn endpoints(&self) -> &Endpoints;

    /// Releases in the order the API returns them (first = latest).
    async fn get_releases(&self, repo: &RepoId) -> Result<Vec<Release>>;

    /// Commit SHA at the head of `branch`.
    async fn get_branch_head(&self, repo: &RepoId, branch: &str) -> Result<String>;

    /// Fetch a URL; 404 yields `None`, other failures are errors.
    async fn fetch_optional(&self, url: &str) -> Result<Option<Vec<u8>>>;

    /// Fetch a URL that must exist.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct GitHub {
    pub http: HttpClient,
    pub endpoints: Endpoints,
}

impl GitHub {
    #[tracing::instrument(skip(http, endpoints))]
    pub fn new(http: HttpClient, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl ReleaseSource for GitHub {
    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[tracing::instrument(skip(self))]
    async fn get_releases(&self, repo: &RepoId) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let mut page = 1;
        let url = self.endpoints.releases_url(repo);

        // Limit to 10 pages (1000 releases)
        while page <= 10 {
            debug!("Fetching releases page {} from {}...", page, url);

            let parsed: Vec<Release> = self
                .http
                .get_json(&format!("{}?per_page=100&page={}", url, page))
                .await
                .with_context(|| format!("Failed to fetch releases for {}", repo))?;

            if parsed.is_empty() {
                break;
            }

            let len = parsed.len();
            releases.extend(parsed);

            if len < 100 {
                break;
            }

            page += 1;
        }

        Ok(releases)
    }

    #[tracing::instrument(skip(self))]
    async fn get_branch_head(&self, repo: &RepoId, branch: &str) -> Result<String> {
        let url = self.endpoints.branch_url(repo, branch);
        debug!("Fetching head of {}@{} from {}...", repo, branch, url);

        let branch: Branch = self
            .http
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch branch {} of {}", branch, repo))?;

        Ok(branch.commit.sha)
    }

    async fn fetch_optional(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.http.get_optional(url).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.http.get_bytes(url).await
    }
}
