use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::application::{AddOutcome, AddRequest, AddUseCase};
use crate::package::{PackageKind, lock};
use crate::runtime::Runtime;

use super::config::Config;

#[derive(Debug, Clone)]
pub struct AddOptions {
    pub url: Option<String>,
    pub version: Option<String>,
    pub kind: PackageKind,
    pub update: bool,
    /// Tags to skip when picking the latest release.
    pub ignored_versions: Vec<String>,
    /// Install every entry of this lock file instead of a single url.
    pub file: Option<PathBuf>,
}

#[tracing::instrument(skip(runtime, config))]
pub async fn add<R: Runtime>(runtime: R, config: Config, options: AddOptions) -> Result<()> {
    let ctx = config.install_context(&runtime);
    let use_case = AddUseCase::new(&ctx, &config.lock_path);

    if let Some(file) = &options.file {
        let packages = lock::read(&runtime, file)?;
        debug!("{} package(s) listed in {:?}", packages.len(), file);
        if packages.is_empty() {
            println!("No packages listed in {}", file.display());
            return Ok(());
        }
        for outcome in use_case.add_all(packages, options.update).await? {
            print_outcome(&outcome);
        }
        return Ok(());
    }

    let url = options
        .url
        .context("A repository URL (or --file) is required")?;
    let request = AddRequest {
        url,
        version: options.version,
        kind: options.kind,
        update: options.update,
        ignored_versions: options.ignored_versions.into_iter().collect(),
    };
    print_outcome(&use_case.add(&request).await?);

    Ok(())
}

fn print_outcome(outcome: &AddOutcome) {
    match outcome {
        AddOutcome::Installed(package) => println!("Installed {}", package),
        AddOutcome::Unchanged(package) => println!("{} is already installed", package),
    }
}
