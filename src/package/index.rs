//! Installed-Package Index: what is actually on disk, found by walking the
//! install folders for manifests. Nothing is cached between calls.

use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::github::RepoId;
use crate::runtime::Runtime;

use super::layout::InstallLayout;
use super::manifest;
use super::model::Package;

pub struct InstalledIndex<'a> {
    runtime: &'a dyn Runtime,
    layout: &'a InstallLayout,
}

impl<'a> InstalledIndex<'a> {
    pub fn new(runtime: &'a dyn Runtime, layout: &'a InstallLayout) -> Self {
        Self { runtime, layout }
    }

    /// Every package with a readable manifest, `path` pointing at its artifact.
    #[tracing::instrument(skip(self))]
    pub fn scan(&self) -> Result<Vec<Package>> {
        let mut packages = Vec::new();

        for dir in self.entries(&self.layout.integrations_dir())? {
            if !self.runtime.is_dir(&dir) {
                continue;
            }
            let manifest = InstallLayout::manifest_candidates(&dir, true)
                .into_iter()
                .find(|candidate| self.runtime.exists(candidate));
            if let Some(manifest) = manifest {
                packages.extend(self.load(&manifest, dir));
            }
        }

        for folder in [self.layout.plugins_dir(), self.layout.themes_dir()] {
            for file in self.entries(&folder)? {
                let Some(artifact) = InstallLayout::artifact_for_manifest(&file) else {
                    continue;
                };
                // A current-format manifest shadows a legacy one for the same artifact
                let [current, _] = InstallLayout::manifest_candidates(&artifact, false);
                if file != current && self.runtime.exists(&current) {
                    debug!("Ignoring {:?}, superseded by {:?}", file, current);
                    continue;
                }
                packages.extend(self.load(&file, artifact));
            }
        }

        debug!("Found {} installed package(s)", packages.len());
        Ok(packages)
    }

    /// The installed package with this url (in any spelling), if any.
    pub fn find(&self, url: &str) -> Result<Option<Package>> {
        let url = RepoId::canonical_url(url);
        Ok(self.scan()?.into_iter().find(|p| p.url == url))
    }

    fn entries(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        if !self.runtime.is_dir(folder) {
            return Ok(Vec::new());
        }
        self.runtime.read_dir(folder)
    }

    fn load(&self, manifest: &Path, artifact: PathBuf) -> Option<Package> {
        match manifest::read(self.runtime, manifest) {
            Ok(package) => Some(package.with_path(artifact)),
            Err(e) => {
                warn!("Skipping unreadable manifest {:?}: {:#}", manifest, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageKind;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::fs;
    use tempfile::tempdir;

    fn write_manifest(path: &Path, package: &Package) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        manifest::write(&RealRuntime, package, path).unwrap();
    }

    #[test]
    fn test_missing_folders_are_empty() {
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        assert!(InstalledIndex::new(&RealRuntime, &layout).scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_finds_every_location() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());

        let integration = Package::new(
            "https://github.com/simbaja/ha_gehome",
            "v0.6.9",
            PackageKind::Integration,
        )
        .unwrap();
        let plugin = Package::new(
            "https://github.com/kalkih/mini-media-player",
            "v1.16.8",
            PackageKind::Plugin,
        )
        .unwrap();
        let theme = Package::new(
            "https://github.com/basnijholt/lovelace-ios-themes",
            "v3.0.1",
            PackageKind::Theme,
        )
        .unwrap();

        let ge_home = layout.integrations_dir().join("ge_home");
        write_manifest(&ge_home.join("unhacs.yaml"), &integration);
        let js = layout.plugins_dir().join("mini-media-player-bundle.js");
        write_manifest(&InstallLayout::manifest_for(&js, false), &plugin);
        let yaml = layout.themes_dir().join("ios-themes.yaml");
        write_manifest(&InstallLayout::manifest_for(&yaml, false), &theme);

        // Not installed by us
        fs::create_dir_all(layout.integrations_dir().join("hand_made")).unwrap();
        fs::write(layout.plugins_dir().join("other.js"), "x").unwrap();

        // --- Execute ---
        let found = InstalledIndex::new(&RealRuntime, &layout).scan().unwrap();

        // --- Verify ---
        assert_eq!(found, vec![integration, plugin, theme]);
        assert_eq!(found[0].path.as_deref(), Some(ge_home.as_path()));
        assert_eq!(found[1].path.as_deref(), Some(js.as_path()));
        assert_eq!(found[2].path.as_deref(), Some(yaml.as_path()));
    }

    #[test]
    fn test_scan_reads_legacy_manifests() {
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());

        let ge_home = layout.integrations_dir().join("ge_home");
        fs::create_dir_all(&ge_home).unwrap();
        fs::write(
            ge_home.join("unhacs.txt"),
            "https://github.com/simbaja/ha_gehome v0.6.9 integration",
        )
        .unwrap();
        fs::create_dir_all(layout.plugins_dir()).unwrap();
        fs::write(
            layout.plugins_dir().join("card.js-unhacs.txt"),
            "https://github.com/owner/card v1 plugin",
        )
        .unwrap();

        let found = InstalledIndex::new(&RealRuntime, &layout).scan().unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].version, "v0.6.9");
        assert_eq!(
            found[1].path,
            Some(layout.plugins_dir().join("card.js"))
        );
    }

    #[test_log::test]
    fn test_scan_skips_broken_manifest() {
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());

        let broken = layout.integrations_dir().join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("unhacs.yaml"), "url: [").unwrap();

        assert!(InstalledIndex::new(&RealRuntime, &layout).scan().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_url() {
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let plugin = Package::new(
            "https://github.com/kalkih/mini-media-player",
            "v1.16.8",
            PackageKind::Plugin,
        )
        .unwrap();
        let js = layout.plugins_dir().join("mini-media-player-bundle.js");
        write_manifest(&InstallLayout::manifest_for(&js, false), &plugin);

        let index = InstalledIndex::new(&RealRuntime, &layout);
        assert_eq!(index.find(&plugin.url).unwrap(), Some(plugin.clone()));
        assert_eq!(index.find("https://github.com/other/repo").unwrap(), None);
        assert_eq!(
            index
                .find("https://github.com/kalkih/mini-media-player.git/")
                .unwrap(),
            Some(plugin)
        );
    }

    #[test]
    fn test_current_manifest_shadows_legacy_one() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let card = layout.plugins_dir().join("card.js");
        let newer = Package::new("https://github.com/owner/card", "v2", PackageKind::Plugin)
            .unwrap();

        write_manifest(&InstallLayout::manifest_for(&card, false), &newer);
        fs::write(
            layout.plugins_dir().join("card.js-unhacs.txt"),
            "https://github.com/owner/card v1 plugin",
        )
        .unwrap();

        // --- Execute ---
        let index = InstalledIndex::new(&RealRuntime, &layout);
        let found = index.scan().unwrap();

        // --- Verify ---
        assert_eq!(found, vec![newer.clone()]);
        assert_eq!(found[0].path.as_deref(), Some(card.as_path()));
        assert_eq!(index.find(&newer.url).unwrap(), Some(newer));
    }

    #[test]
    fn test_scan_rewalks_every_call() {
        // --- Setup ---
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().times(6).returning(|_| false);

        let layout = InstallLayout::new("/config");
        let index = InstalledIndex::new(&runtime, &layout);

        // --- Execute & Verify ---
        assert!(index.scan().unwrap().is_empty());
        assert!(index.scan().unwrap().is_empty());
    }
}
