use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::archive::Extractor;
use crate::github::ReleaseSource;
use crate::runtime::Runtime;

use super::index::InstalledIndex;
use super::layout::InstallLayout;
use super::manifest;
use super::model::{Package, PackageKind};
use super::resolver::{ReleaseResolver, Resolution};
use super::{asset, fork, integration};

/// Collaborators an install needs, bound to one configuration root.
pub struct InstallContext<'a> {
    pub runtime: &'a dyn Runtime,
    pub source: &'a dyn ReleaseSource,
    pub extractor: &'a dyn Extractor,
    pub layout: InstallLayout,
}

impl<'a> InstallContext<'a> {
    pub fn new(
        runtime: &'a dyn Runtime,
        source: &'a dyn ReleaseSource,
        extractor: &'a dyn Extractor,
        layout: InstallLayout,
    ) -> Self {
        Self {
            runtime,
            source,
            extractor,
            layout,
        }
    }

    pub fn index(&self) -> InstalledIndex<'_> {
        InstalledIndex::new(self.runtime, &self.layout)
    }
}

impl Package {
    /// Build a package from user input, resolving the version against live data.
    ///
    /// Without `version` this is the latest release not in `ignored_versions` (branch
    /// head for forks). With one, the tag must exist; a fork takes the given commit as-is.
    /// The ignore list is kept on the returned package.
    #[tracing::instrument(skip(source))]
    pub async fn resolve(
        url: &str,
        version: Option<&str>,
        kind: PackageKind,
        ignored_versions: &BTreeSet<String>,
        source: &dyn ReleaseSource,
    ) -> Result<Self> {
        let mut package = Package::new(url, version.unwrap_or_default(), kind)?
            .with_ignored_versions(ignored_versions.iter().cloned());
        let resolution = ReleaseResolver::new(source)
            .resolve(
                &package.repo(),
                &package.kind,
                version,
                &package.ignored_versions,
            )
            .await?;

        package.version = resolution.version.clone();
        package.resolution = Some(resolution);
        Ok(package)
    }

    /// Download, place, and record this package under the configuration root.
    ///
    /// Any existing install at the destination is removed first. Returns the
    /// artifact path.
    #[tracing::instrument(skip(self, ctx), fields(package = %self))]
    pub async fn install(&self, ctx: &InstallContext<'_>) -> Result<PathBuf> {
        let resolution = match &self.resolution {
            Some(resolution) if resolution.version == self.version => resolution.clone(),
            _ => {
                ReleaseResolver::new(ctx.source)
                    .pinned(&self.repo(), &self.kind, &self.version)
                    .await?
            }
        };

        let (artifact, is_dir) = match &self.kind {
            PackageKind::Integration => (integration::install(ctx, self, &resolution).await?, true),
            PackageKind::Plugin | PackageKind::Theme => {
                (asset::install(ctx, self, &resolution).await?, false)
            }
            PackageKind::Fork { fork_component, .. } => (
                fork::install(ctx, self, fork_component, &resolution).await?,
                true,
            ),
        };

        let [current, stale] = InstallLayout::manifest_candidates(&artifact, is_dir);
        manifest::write(ctx.runtime, self, &current)?;
        // One manifest per artifact: drop a legacy one left by an earlier install
        if ctx.runtime.exists(&stale) {
            debug!("Removing superseded manifest {:?}", stale);
            ctx.runtime.remove_file(&stale)?;
        }

        info!("Installed {} to {:?}", self, artifact);
        Ok(artifact)
    }

    /// Remove this package's artifact and manifest. `false` means nothing was installed.
    #[tracing::instrument(skip(self, runtime, layout), fields(package = %self))]
    pub fn uninstall(&self, runtime: &dyn Runtime, layout: &InstallLayout) -> Result<bool> {
        if let Some(path) = &self.path {
            remove_artifact(runtime, path)?;
            info!("Removed {} from {:?}", self, path);
            return Ok(true);
        }

        match self.installed(runtime, layout)? {
            Some(installed) => installed.uninstall(runtime, layout),
            None => {
                debug!("{} is not installed", self.name);
                Ok(false)
            }
        }
    }

    /// The on-disk package with the same url, if any.
    pub fn installed(&self, runtime: &dyn Runtime, layout: &InstallLayout) -> Result<Option<Package>> {
        InstalledIndex::new(runtime, layout).find(&self.url)
    }

    /// True when nothing is installed for this url or the installed version differs.
    pub fn is_update(&self, runtime: &dyn Runtime, layout: &InstallLayout) -> Result<bool> {
        Ok(self
            .installed(runtime, layout)?
            .is_none_or(|installed| installed.version != self.version))
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }
}

/// Move `source` to `dest`, replacing whatever was there.
pub(super) fn replace_dir(runtime: &dyn Runtime, source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent)?;
    }
    if runtime.exists(dest) {
        debug!("Removing previous install at {:?}", dest);
        runtime.remove_dir_all(dest)?;
    }
    runtime
        .rename(source, dest)
        .with_context(|| format!("Failed to move {:?} to {:?}", source, dest))
}

/// Write `contents` to `dest`, replacing whatever was there.
pub(super) fn replace_file(runtime: &dyn Runtime, dest: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent)?;
    }
    if runtime.is_dir(dest) {
        runtime.remove_dir_all(dest)?;
    }
    runtime
        .write(dest, contents)
        .with_context(|| format!("Failed to write {:?}", dest))
}

fn remove_artifact(runtime: &dyn Runtime, path: &Path) -> Result<()> {
    if runtime.is_dir(path) {
        // The manifest lives inside the directory
        return runtime.remove_dir_all(path);
    }

    if runtime.exists(path) {
        runtime.remove_file(path)?;
    }
    for manifest in InstallLayout::manifest_candidates(path, false) {
        if runtime.exists(&manifest) {
            runtime.remove_file(&manifest)?;
        }
    }
    Ok(())
}
