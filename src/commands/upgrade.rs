use anyhow::Result;

use crate::application::{PlannedUpgrade, UpgradeUseCase};
use crate::runtime::Runtime;

use super::config::Config;

#[tracing::instrument(skip(runtime, config))]
pub async fn upgrade<R: Runtime>(
    runtime: R,
    config: Config,
    selectors: &[String],
    yes: bool,
) -> Result<()> {
    let ctx = config.install_context(&runtime);
    let use_case = UpgradeUseCase::new(&ctx, &config.lock_path);

    let plan = use_case.plan(selectors).await?;
    if plan.is_empty() {
        println!("All packages are up to date.");
        return Ok(());
    }

    if !yes {
        show_upgrade_plan(&plan);
        if !runtime.confirm("Proceed with upgrade?")? {
            println!("Upgrade cancelled.");
            return Ok(());
        }
    }

    use_case.apply(&plan).await?;
    for upgrade in &plan {
        println!(
            "Upgraded {} {} -> {}",
            upgrade.installed.name, upgrade.installed.version, upgrade.target.version
        );
    }

    Ok(())
}

fn show_upgrade_plan(plan: &[PlannedUpgrade]) {
    println!();
    println!("=== Upgrade Plan ===");
    println!();
    for upgrade in plan {
        println!(
            "  {} {} -> {}",
            upgrade.installed.name, upgrade.installed.version, upgrade.target.version
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::seed_installed;
    use crate::commands::config::Settings;
    use crate::package::{Package, PackageKind, lock};
    use crate::runtime::RealRuntime;
    use mockito::Server;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upgrade_plugin_to_latest_release() {
        // --- Setup ---
        let mut server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let settings = Settings {
            config_root: Some(dir.path().to_path_buf()),
            api_url: Some(server.url()),
            raw_url: Some(server.url()),
            web_url: Some(server.url()),
            ..Default::default()
        };
        let config = Config::new(&RealRuntime, settings).unwrap();
        let url = format!("{}/kalkih/mini-media-player", server.url());
        let installed = Package::new(&url, "v1.16.8", PackageKind::Plugin).unwrap();
        seed_installed(&config.layout(), &installed, "mini-media-player.js");
        let lock_path = config.lock_path.clone();
        let plugin_file = config.layout().plugins_dir().join("mini-media-player.js");

        let _releases = server
            .mock("GET", "/repos/kalkih/mini-media-player/releases")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"tag_name": "v1.16.9"}, {"tag_name": "v1.16.8"}]"#)
            .expect_at_least(1)
            .create_async()
            .await;
        let _descriptor = server
            .mock("GET", "/kalkih/mini-media-player/v1.16.9/hacs.json")
            .with_status(404)
            .create_async()
            .await;
        let _artifact = server
            .mock("GET", "/kalkih/mini-media-player/v1.16.9/dist/mini-media-player.js")
            .with_status(200)
            .with_body("// v1.16.9")
            .create_async()
            .await;

        // --- Execute ---
        upgrade(RealRuntime, config, &[], true).await.unwrap();

        // --- Verify ---
        assert_eq!(std::fs::read_to_string(plugin_file).unwrap(), "// v1.16.9");
        let locked = lock::read(&RealRuntime, &lock_path).unwrap();
        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].version, "v1.16.9");
    }
}
