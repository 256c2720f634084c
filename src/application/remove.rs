//! Remove use case - uninstall selected packages and drop them from the lock file.

use anyhow::Result;
use log::{debug, warn};
use std::path::Path;

use crate::package::{InstallLayout, InstalledIndex, Package, lock};
use crate::reconcile::{Decision, plan_remove};
use crate::runtime::Runtime;

use super::select;

pub struct RemoveUseCase<'a> {
    runtime: &'a dyn Runtime,
    layout: &'a InstallLayout,
    lock_path: &'a Path,
}

impl<'a> RemoveUseCase<'a> {
    pub fn new(runtime: &'a dyn Runtime, layout: &'a InstallLayout, lock_path: &'a Path) -> Self {
        Self {
            runtime,
            layout,
            lock_path,
        }
    }

    /// Installed packages named by `selectors`. Selectors that match nothing are
    /// a no-op, not an error.
    pub fn plan(&self, selectors: &[String]) -> Result<Vec<Package>> {
        let installed = InstalledIndex::new(self.runtime, self.layout).scan()?;
        let selected = select(&installed, selectors);

        for selector in selectors {
            let hit = selected.iter().copied().find(|p| p.matches(selector));
            if plan_remove(hit) == Decision::NoOp {
                warn!("{} is not installed", selector);
            }
        }

        Ok(selected.into_iter().cloned().collect())
    }

    /// Uninstall each package and drop its lock entry. Returns how many were removed.
    #[tracing::instrument(skip(self, packages))]
    pub fn remove(&self, packages: &[Package]) -> Result<usize> {
        let mut removed = 0;
        for package in packages {
            if package.uninstall(self.runtime, self.layout)? {
                removed += 1;
            }
            if lock::remove(self.runtime, self.lock_path, &package.url)? {
                debug!("Dropped {} from {:?}", package.name, self.lock_path);
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::seed_installed;
    use crate::package::PackageKind;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    const PLUGIN_URL: &str = "https://github.com/kalkih/mini-media-player";
    const FORK_URL: &str = "https://github.com/ViViDboarder/home-assistant";

    fn fork() -> Package {
        Package::new(
            FORK_URL,
            "3b2893f2f4e16f9a05d9cc4a7ba9f31984c841be",
            PackageKind::Fork {
                fork_component: "nextbus".into(),
                branch_name: "dev".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_plan_by_name_and_url() {
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let plugin = Package::new(PLUGIN_URL, "v1.16.8", PackageKind::Plugin).unwrap();
        seed_installed(&layout, &plugin, "mini-media-player-bundle.js");
        seed_installed(&layout, &fork(), "nextbus");
        let lock_path = dir.path().join("unhacs.yaml");

        let use_case = RemoveUseCase::new(&RealRuntime, &layout, &lock_path);

        assert_eq!(
            use_case.plan(&["mini-media-player".to_string()]).unwrap(),
            vec![plugin]
        );
        assert_eq!(use_case.plan(&[FORK_URL.to_string()]).unwrap(), vec![fork()]);
        assert!(use_case.plan(&["missing".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_remove_deletes_artifacts_manifests_and_lock_entries() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let plugin = Package::new(PLUGIN_URL, "v1.16.8", PackageKind::Plugin).unwrap();
        seed_installed(&layout, &plugin, "mini-media-player-bundle.js");
        seed_installed(&layout, &fork(), "nextbus");
        let lock_path = dir.path().join("unhacs.yaml");
        lock::write(&RealRuntime, &lock_path, &[plugin.clone(), fork()]).unwrap();

        let use_case = RemoveUseCase::new(&RealRuntime, &layout, &lock_path);

        // --- Execute ---
        let plan = use_case
            .plan(&["mini-media-player".to_string(), "home-assistant".to_string()])
            .unwrap();
        let removed = use_case.remove(&plan).unwrap();

        // --- Verify ---
        assert_eq!(removed, 2);
        assert!(!layout.plugins_dir().join("mini-media-player-bundle.js").exists());
        assert!(
            !layout
                .plugins_dir()
                .join("mini-media-player-bundle.js-unhacs.yaml")
                .exists()
        );
        assert!(!layout.integrations_dir().join("nextbus").exists());
        assert!(InstalledIndex::new(&RealRuntime, &layout).scan().unwrap().is_empty());
        assert!(lock::read(&RealRuntime, &lock_path).unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_package_is_noop() {
        let dir = tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let lock_path = dir.path().join("unhacs.yaml");

        let removed = RemoveUseCase::new(&RealRuntime, &layout, &lock_path)
            .remove(&[Package::new(PLUGIN_URL, "v1", PackageKind::Plugin).unwrap()])
            .unwrap();

        assert_eq!(removed, 0);
        assert!(!lock_path.exists());
    }
}
