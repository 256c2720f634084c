//! Release Resolver: pick a release, read the optional descriptor, and work out
//! where the artifact for a variant comes from.

use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeSet;

use crate::error::PackageError;
use crate::github::{Endpoints, Release, ReleaseSource, RepoId};

use super::descriptor::{DESCRIPTOR_FILE, Descriptor};
use super::model::{PackageKind, PackageType};

/// Outcome of resolving a package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub version: String,
    pub descriptor: Option<Descriptor>,
    pub download: DownloadRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRef {
    /// Repository snapshot: tag archive for integrations, branch archive for forks.
    Archive(String),
    /// Single-file artifact, searched over these candidates in order.
    Artifact(Vec<ArtifactCandidate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub filename: String,
    /// Download URL of a release asset with exactly this name, when the release lists one.
    pub asset_url: Option<String>,
}

/// Pick the release to install.
///
/// The first entry not in `ignored` is the latest; the API's ordering is trusted
/// as-is. An explicit version must exactly match a tag and may be an ignored one.
pub fn select_release<'r>(
    releases: &'r [Release],
    version: Option<&str>,
    ignored: &BTreeSet<String>,
    package: &str,
) -> Result<&'r Release, PackageError> {
    if releases.is_empty() {
        return Err(PackageError::resolution(package, "no releases found"));
    }

    match version {
        None => releases
            .iter()
            .find(|release| !ignored.contains(&release.tag_name))
            .ok_or_else(|| PackageError::resolution(package, "every release is ignored")),
        Some(version) => releases
            .iter()
            .find(|release| release.tag_name == version)
            .ok_or_else(|| {
                PackageError::resolution(package, format!("version {} does not exist", version))
            }),
    }
}

/// File names to look for, in order. A descriptor-configured name replaces the conventions.
pub fn candidate_filenames(
    name: &str,
    package_type: PackageType,
    descriptor: Option<&Descriptor>,
) -> Vec<String> {
    if let Some(filename) = descriptor.and_then(|d| d.filename.as_deref()) {
        return vec![filename.to_string()];
    }

    let stem = name.strip_prefix("lovelace-").unwrap_or(name);
    let conventional = match package_type {
        PackageType::Theme => vec![format!("{stem}.yaml"), format!("{name}.yaml")],
        _ => vec![
            format!("{stem}.js"),
            format!("{name}.js"),
            format!("{stem}-bundle.js"),
        ],
    };

    let mut candidates: Vec<String> = Vec::with_capacity(conventional.len());
    for candidate in conventional {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Raw-content directory holding built artifacts for a single-file variant.
pub fn dist_dir(package_type: PackageType) -> &'static str {
    match package_type {
        PackageType::Theme => "themes",
        _ => "dist",
    }
}

/// Lazily enumerate `(filename, url)` attempts: for each candidate, the raw dist
/// path, then the release asset, then the raw root path.
pub fn artifact_urls<'a>(
    endpoints: &'a Endpoints,
    repo: &'a RepoId,
    version: &'a str,
    dist_dir: &'a str,
    candidates: &'a [ArtifactCandidate],
) -> impl Iterator<Item = (&'a str, String)> + 'a {
    candidates.iter().flat_map(move |candidate| {
        let filename = candidate.filename.as_str();
        let asset = candidate
            .asset_url
            .clone()
            .unwrap_or_else(|| endpoints.release_asset_url(repo, version, filename));
        [
            endpoints.raw_file_url(repo, version, &format!("{}/{}", dist_dir, filename)),
            asset,
            endpoints.raw_file_url(repo, version, filename),
        ]
        .into_iter()
        .map(move |url| (filename, url))
    })
}

pub struct ReleaseResolver<'a> {
    source: &'a dyn ReleaseSource,
}

impl<'a> ReleaseResolver<'a> {
    pub fn new(source: &'a dyn ReleaseSource) -> Self {
        Self { source }
    }

    /// Resolve against live data: the latest release not in `ignored` (or branch head
    /// for forks) when `version` is `None`, otherwise the release tagged exactly `version`.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        repo: &RepoId,
        kind: &PackageKind,
        version: Option<&str>,
        ignored: &BTreeSet<String>,
    ) -> Result<Resolution> {
        if let PackageKind::Fork { branch_name, .. } = kind {
            let version = match version {
                Some(version) => version.to_string(),
                None => self.source.get_branch_head(repo, branch_name).await?,
            };
            return Ok(self.fork_resolution(repo, branch_name, version));
        }

        let releases = self.source.get_releases(repo).await?;
        let release = select_release(&releases, version, ignored, &repo.to_string())?;
        info!("Resolved {} to {}", repo, release.tag_name);

        self.for_version(repo, kind, &release.tag_name, Some(release))
            .await
    }

    /// Resolve an already pinned version without consulting the releases list.
    #[tracing::instrument(skip(self))]
    pub async fn pinned(&self, repo: &RepoId, kind: &PackageKind, version: &str) -> Result<Resolution> {
        match kind {
            PackageKind::Fork { branch_name, .. } => {
                Ok(self.fork_resolution(repo, branch_name, version.to_string()))
            }
            _ => self.for_version(repo, kind, version, None).await,
        }
    }

    /// Fetch the descriptor at `git_ref`; a missing file is `None`.
    #[tracing::instrument(skip(self))]
    pub async fn descriptor(&self, repo: &RepoId, git_ref: &str) -> Result<Option<Descriptor>> {
        let url = self
            .source
            .endpoints()
            .raw_file_url(repo, git_ref, DESCRIPTOR_FILE);

        match self.source.fetch_optional(&url).await? {
            Some(bytes) => Ok(Some(Descriptor::parse(&bytes)?)),
            None => {
                debug!("{} has no {} at {}", repo, DESCRIPTOR_FILE, git_ref);
                Ok(None)
            }
        }
    }

    /// Try every candidate and URL shape in order; the first success wins and the
    /// remaining attempts are never made.
    #[tracing::instrument(skip(self, candidates))]
    pub async fn fetch_artifact(
        &self,
        repo: &RepoId,
        version: &str,
        dist_dir: &str,
        candidates: &[ArtifactCandidate],
    ) -> Result<(String, Vec<u8>)> {
        let endpoints = self.source.endpoints();
        let mut tried = Vec::new();

        for (filename, url) in artifact_urls(endpoints, repo, version, dist_dir, candidates) {
            debug!("Trying {} at {}", filename, url);
            if let Some(body) = self.source.fetch_optional(&url).await? {
                info!("Found {} at {}", filename, url);
                return Ok((filename.to_string(), body));
            }
            tried.push(url);
        }

        Err(PackageError::NoValidArtifact {
            package: repo.to_string(),
            tried,
        }
        .into())
    }

    fn fork_resolution(&self, repo: &RepoId, branch_name: &str, version: String) -> Resolution {
        Resolution {
            version,
            descriptor: None,
            download: DownloadRef::Archive(
                self.source.endpoints().branch_archive_url(repo, branch_name),
            ),
        }
    }

    async fn for_version(
        &self,
        repo: &RepoId,
        kind: &PackageKind,
        version: &str,
        release: Option<&Release>,
    ) -> Result<Resolution> {
        let descriptor = self.descriptor(repo, version).await?;

        let download = match kind.package_type() {
            PackageType::Plugin | PackageType::Theme => {
                let candidates =
                    candidate_filenames(&repo.name, kind.package_type(), descriptor.as_ref())
                        .into_iter()
                        .map(|filename| ArtifactCandidate {
                            asset_url: release
                                .and_then(|r| r.find_asset(&filename))
                                .map(|asset| asset.browser_download_url.clone()),
                            filename,
                        })
                        .collect();
                DownloadRef::Artifact(candidates)
            }
            PackageType::Integration | PackageType::Fork => {
                DownloadRef::Archive(self.source.endpoints().tag_archive_url(repo, version))
            }
        };

        Ok(Resolution {
            version: version.to_string(),
            descriptor,
            download,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{GitHub, MockReleaseSource, ReleaseAsset};
    use crate::http::HttpClient;
    use mockall::predicate::eq;

    fn release(tag: &str) -> Release {
        Release {
            tag_name: tag.to_string(),
            ..Default::default()
        }
    }

    fn repo(name: &str) -> RepoId {
        RepoId {
            owner: "owner".into(),
            name: name.into(),
        }
    }

    fn candidates(names: &[&str]) -> Vec<ArtifactCandidate> {
        names
            .iter()
            .map(|name| ArtifactCandidate {
                filename: name.to_string(),
                asset_url: None,
            })
            .collect()
    }

    #[test]
    fn test_select_release_defaults_to_first_entry() {
        // Deliberately not in version order
        let releases = vec![release("v1.0.0"), release("v2.0.0")];
        assert_eq!(
            select_release(&releases, None, &BTreeSet::new(), "pkg")
                .unwrap()
                .tag_name,
            "v1.0.0"
        );
    }

    #[test]
    fn test_select_release_skips_ignored_versions() {
        let releases = vec![release("v2.1.0-beta"), release("v2.0.0"), release("v1.0.0")];
        let ignored = BTreeSet::from(["v2.1.0-beta".to_string(), "v2.0.0".to_string()]);

        assert_eq!(
            select_release(&releases, None, &ignored, "pkg")
                .unwrap()
                .tag_name,
            "v1.0.0"
        );
        // An explicit version wins over the ignore list
        assert_eq!(
            select_release(&releases, Some("v2.0.0"), &ignored, "pkg")
                .unwrap()
                .tag_name,
            "v2.0.0"
        );

        let all = BTreeSet::from(["v2.1.0-beta", "v2.0.0", "v1.0.0"].map(String::from));
        assert_eq!(
            select_release(&releases, None, &all, "pkg"),
            Err(PackageError::resolution("pkg", "every release is ignored"))
        );
    }

    #[test]
    fn test_select_release_exact_match() {
        let releases = vec![release("v2.0.0"), release("v1.0.0")];
        assert_eq!(
            select_release(&releases, Some("v1.0.0"), &BTreeSet::new(), "pkg")
                .unwrap()
                .tag_name,
            "v1.0.0"
        );
        assert!(matches!(
            select_release(&releases, Some("1.0.0"), &BTreeSet::new(), "pkg"),
            Err(PackageError::Resolution { .. })
        ));
    }

    #[test]
    fn test_select_release_no_releases() {
        assert_eq!(
            select_release(&[], None, &BTreeSet::new(), "pkg"),
            Err(PackageError::resolution("pkg", "no releases found"))
        );
    }

    #[test]
    fn test_candidate_filenames() {
        assert_eq!(
            candidate_filenames("mini-media-player", PackageType::Plugin, None),
            vec!["mini-media-player.js", "mini-media-player-bundle.js"]
        );
        assert_eq!(
            candidate_filenames("lovelace-card", PackageType::Plugin, None),
            vec!["card.js", "lovelace-card.js", "card-bundle.js"]
        );
        assert_eq!(
            candidate_filenames("lovelace-ios-themes", PackageType::Theme, None),
            vec!["ios-themes.yaml", "lovelace-ios-themes.yaml"]
        );

        let descriptor = Descriptor {
            filename: Some("custom.js".into()),
            content_in_root: false,
        };
        assert_eq!(
            candidate_filenames("lovelace-card", PackageType::Plugin, Some(&descriptor)),
            vec!["custom.js"]
        );
    }

    #[test]
    fn test_artifact_urls_order() {
        let endpoints = Endpoints::default();
        let repo = repo("card");
        let mut list = candidates(&["a.js", "b.js"]);
        list[1].asset_url = Some("https://cdn.example.com/b.js".into());

        let urls: Vec<_> = artifact_urls(&endpoints, &repo, "v1", "dist", &list).collect();

        assert_eq!(
            urls,
            vec![
                ("a.js", "https://raw.githubusercontent.com/owner/card/v1/dist/a.js".to_string()),
                ("a.js", "https://github.com/owner/card/releases/download/v1/a.js".to_string()),
                ("a.js", "https://raw.githubusercontent.com/owner/card/v1/a.js".to_string()),
                ("b.js", "https://raw.githubusercontent.com/owner/card/v1/dist/b.js".to_string()),
                ("b.js", "https://cdn.example.com/b.js".to_string()),
                ("b.js", "https://raw.githubusercontent.com/owner/card/v1/b.js".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_latest_plugin_matches_release_asset() {
        // --- Setup ---
        let mut source = MockReleaseSource::new();
        let endpoints = Endpoints::default();
        source.expect_endpoints().return_const(endpoints);
        source.expect_get_releases().times(1).returning(|_| {
            Ok(vec![Release {
                tag_name: "v1.16.8".into(),
                zipball_url: None,
                assets: vec![ReleaseAsset {
                    name: "mini-media-player-bundle.js".into(),
                    browser_download_url: "https://example.com/bundle.js".into(),
                }],
            }])
        });
        source
            .expect_fetch_optional()
            .with(eq(
                "https://raw.githubusercontent.com/owner/mini-media-player/v1.16.8/hacs.json",
            ))
            .times(1)
            .returning(|_| Ok(Some(br#"{"filename": "mini-media-player-bundle.js"}"#.to_vec())));

        // --- Execute ---
        let resolution = ReleaseResolver::new(&source)
            .resolve(&repo("mini-media-player"), &PackageKind::Plugin, None, &BTreeSet::new())
            .await
            .unwrap();

        // --- Verify ---
        assert_eq!(resolution.version, "v1.16.8");
        assert_eq!(
            resolution.download,
            DownloadRef::Artifact(vec![ArtifactCandidate {
                filename: "mini-media-player-bundle.js".into(),
                asset_url: Some("https://example.com/bundle.js".into()),
            }])
        );
    }

    #[tokio::test]
    async fn test_resolve_explicit_version_missing() {
        let mut source = MockReleaseSource::new();
        source.expect_endpoints().return_const(Endpoints::default());
        source
            .expect_get_releases()
            .returning(|_| Ok(vec![release("v2.0.0")]));
        source.expect_fetch_optional().never();

        let err = ReleaseResolver::new(&source)
            .resolve(
                &repo("ha_gehome"),
                &PackageKind::Integration,
                Some("v0.6.9"),
                &BTreeSet::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PackageError>(),
            Some(PackageError::Resolution { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_integration_uses_tag_archive() {
        let mut source = MockReleaseSource::new();
        source.expect_endpoints().return_const(Endpoints::default());
        source
            .expect_get_releases()
            .returning(|_| Ok(vec![release("v0.7.0"), release("v0.6.9")]));
        source.expect_fetch_optional().returning(|_| Ok(None));

        let resolution = ReleaseResolver::new(&source)
            .resolve(&repo("ha_gehome"), &PackageKind::Integration, None, &BTreeSet::new())
            .await
            .unwrap();

        assert_eq!(resolution.version, "v0.7.0");
        assert_eq!(resolution.descriptor, None);
        assert_eq!(
            resolution.download,
            DownloadRef::Archive(
                "https://github.com/owner/ha_gehome/archive/refs/tags/v0.7.0.zip".into()
            )
        );
    }

    #[tokio::test]
    async fn test_resolve_latest_skips_ignored_release() {
        // --- Setup ---
        let mut source = MockReleaseSource::new();
        source.expect_endpoints().return_const(Endpoints::default());
        source
            .expect_get_releases()
            .returning(|_| Ok(vec![release("v0.7.0"), release("v0.6.9")]));
        source
            .expect_fetch_optional()
            .with(eq(
                "https://raw.githubusercontent.com/owner/ha_gehome/v0.6.9/hacs.json",
            ))
            .times(1)
            .returning(|_| Ok(None));
        let ignored = BTreeSet::from(["v0.7.0".to_string()]);

        // --- Execute ---
        let resolution = ReleaseResolver::new(&source)
            .resolve(&repo("ha_gehome"), &PackageKind::Integration, None, &ignored)
            .await
            .unwrap();

        // --- Verify ---
        assert_eq!(resolution.version, "v0.6.9");
        assert_eq!(
            resolution.download,
            DownloadRef::Archive(
                "https://github.com/owner/ha_gehome/archive/refs/tags/v0.6.9.zip".into()
            )
        );
    }

    #[tokio::test]
    async fn test_resolve_fork_uses_branch_head_not_releases() {
        let mut source = MockReleaseSource::new();
        source.expect_endpoints().return_const(Endpoints::default());
        source.expect_get_releases().never();
        source
            .expect_get_branch_head()
            .withf(|_, branch| branch == "dev")
            .times(1)
            .returning(|_, _| Ok("3b2893f2f4e16f9a05d9cc4a7ba9f31984c841be".into()));

        let kind = PackageKind::Fork {
            fork_component: "nextbus".into(),
            branch_name: "dev".into(),
        };
        let resolution = ReleaseResolver::new(&source)
            .resolve(&repo("home-assistant"), &kind, None, &BTreeSet::from(["x".to_string()]))
            .await
            .unwrap();

        assert_eq!(resolution.version, "3b2893f2f4e16f9a05d9cc4a7ba9f31984c841be");
        assert_eq!(
            resolution.download,
            DownloadRef::Archive(
                "https://github.com/owner/home-assistant/archive/refs/heads/dev.zip".into()
            )
        );
    }

    #[tokio::test]
    async fn test_pinned_skips_releases_list() {
        let mut source = MockReleaseSource::new();
        source.expect_endpoints().return_const(Endpoints::default());
        source.expect_get_releases().never();
        source.expect_fetch_optional().times(1).returning(|_| Ok(None));

        let resolution = ReleaseResolver::new(&source)
            .pinned(&repo("lovelace-ios-themes"), &PackageKind::Theme, "v3.0.1")
            .await
            .unwrap();

        assert_eq!(
            resolution.download,
            DownloadRef::Artifact(candidates(&["ios-themes.yaml", "lovelace-ios-themes.yaml"]))
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_artifact_stops_at_first_success() {
        // --- Setup ---
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mut misses = Vec::new();
        for path in [
            "/owner/card/v1/dist/a.js",
            "/owner/card/releases/download/v1/a.js",
            "/owner/card/v1/a.js",
            "/owner/card/v1/dist/b.js",
        ] {
            misses.push(
                server
                    .mock("GET", path)
                    .with_status(404)
                    .expect(1)
                    .create_async()
                    .await,
            );
        }
        let hit = server
            .mock("GET", "/owner/card/releases/download/v1/b.js")
            .with_status(200)
            .with_body("b-content")
            .expect(1)
            .create_async()
            .await;
        let never = server
            .mock("GET", mockito::Matcher::Regex(r"/c\.js$".into()))
            .expect(0)
            .create_async()
            .await;

        let source = GitHub::new(
            HttpClient::new(reqwest::Client::new()),
            Endpoints::single_host(&url),
        );

        // --- Execute ---
        let (filename, body) = ReleaseResolver::new(&source)
            .fetch_artifact(&repo("card"), "v1", "dist", &candidates(&["a.js", "b.js", "c.js"]))
            .await
            .unwrap();

        // --- Verify ---
        assert_eq!(filename, "b.js");
        assert_eq!(body, b"b-content");
        for mock in misses {
            mock.assert_async().await;
        }
        hit.assert_async().await;
        never.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_artifact_all_missing() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let source = GitHub::new(
            HttpClient::new(reqwest::Client::new()),
            Endpoints::single_host(&url),
        );

        let err = ReleaseResolver::new(&source)
            .fetch_artifact(&repo("card"), "v1", "dist", &candidates(&["a.js"]))
            .await
            .unwrap_err();

        match err.downcast_ref::<PackageError>() {
            Some(PackageError::NoValidArtifact { tried, .. }) => assert_eq!(tried.len(), 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_artifact_propagates_server_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _first = server
            .mock("GET", "/owner/card/v1/dist/a.js")
            .with_status(500)
            .create_async()
            .await;
        let later = server
            .mock("GET", "/owner/card/releases/download/v1/a.js")
            .expect(0)
            .create_async()
            .await;

        let source = GitHub::new(
            HttpClient::new(reqwest::Client::new()),
            Endpoints::single_host(&url),
        );

        let err = ReleaseResolver::new(&source)
            .fetch_artifact(&repo("card"), "v1", "dist", &candidates(&["a.js"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PackageError>(),
            Some(PackageError::Transport { status: 500, .. })
        ));
        later.assert_async().await;
    }
}
