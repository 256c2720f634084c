use anyhow::Result;
use log::debug;

use crate::{application::ListUseCase, runtime::Runtime};

use super::config::Config;

/// List installed packages, optionally writing them to the lock file.
#[tracing::instrument(skip(runtime, config))]
pub fn list<R: Runtime>(runtime: R, config: Config, verbose: bool, freeze: bool) -> Result<()> {
    let layout = config.layout();
    let use_case = ListUseCase::new(&runtime, &layout);

    debug!("Listing packages under {:?}", config.root);

    let packages = if freeze {
        use_case.freeze(&config.lock_path)?
    } else {
        use_case.installed()?
    };

    if packages.is_empty() {
        println!("No packages installed.");
    }

    for package in &packages {
        if verbose {
            println!("{}", package.verbose());
        } else {
            println!("{}", package);
        }
    }

    if freeze {
        println!(
            "Wrote {} package(s) to {}",
            packages.len(),
            config.lock_path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::seed_installed;
    use crate::commands::config::Settings;
    use crate::package::{InstallLayout, Package, PackageKind, lock};
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config_for(root: PathBuf) -> Config {
        let settings = Settings {
            config_root: Some(root),
            ..Default::default()
        };
        Config::new(&RealRuntime, settings).unwrap()
    }

    #[test]
    fn test_list_no_packages() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| false);

        let result = list(runtime, config_for(PathBuf::from("/config")), false, false);
        assert!(result.is_ok());
    }

    #[test]
    fn test_list_freeze_writes_lock_file() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let package = Package::new(
            "https://github.com/simbaja/ha_gehome",
            "v0.6.9",
            PackageKind::Integration,
        )
        .unwrap();
        seed_installed(&InstallLayout::new(dir.path()), &package, "ge_home");

        // --- Execute ---
        list(RealRuntime, config_for(dir.path().to_path_buf()), true, true).unwrap();

        // --- Verify ---
        let locked = lock::read(&RealRuntime, &dir.path().join("unhacs.yaml")).unwrap();
        assert_eq!(locked, vec![package]);
    }
}
