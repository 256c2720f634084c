use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

use super::lifecycle::{InstallContext, replace_file};
use super::model::Package;
use super::resolver::{DownloadRef, ReleaseResolver, Resolution, dist_dir};

/// Install a single-file plugin or theme found by walking its candidate chain.
pub(super) async fn install(
    ctx: &InstallContext<'_>,
    package: &Package,
    resolution: &Resolution,
) -> Result<PathBuf> {
    let DownloadRef::Artifact(candidates) = &resolution.download else {
        return Err(anyhow!("{} does not resolve to a single-file artifact", package));
    };

    let package_type = package.package_type();
    let (filename, body) = ReleaseResolver::new(ctx.source)
        .fetch_artifact(
            &package.repo(),
            &package.version,
            dist_dir(package_type),
            candidates,
        )
        .await?;

    // A descriptor filename may carry a directory; only the file name is kept
    let file_name = Path::new(&filename)
        .file_name()
        .ok_or_else(|| anyhow!("Invalid artifact file name '{}'", filename))?;

    let dest = ctx.layout.dir_for(package_type).join(file_name);
    replace_file(ctx.runtime, &dest, &body)?;
    Ok(dest)
}
