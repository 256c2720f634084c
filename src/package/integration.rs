use anyhow::{Result, anyhow};
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::PackageError;

use super::descriptor::{DESCRIPTOR_FILE, Descriptor};
use super::layout::{INTEGRATIONS_DIR, WORKSPACE_PREFIX};
use super::lifecycle::{InstallContext, replace_dir};
use super::model::Package;
use super::resolver::{DownloadRef, Resolution};

/// Install an integration from the repository snapshot at its tag.
///
/// The first `custom_components/*` directory in the snapshot is installed under its
/// own name. Without one, a descriptor with `content_in_root` installs the whole
/// snapshot as `custom_components/<package name>`.
pub(super) async fn install(
    ctx: &InstallContext<'_>,
    package: &Package,
    resolution: &Resolution,
) -> Result<PathBuf> {
    let DownloadRef::Archive(url) = &resolution.download else {
        return Err(anyhow!("{} does not resolve to a source archive", package));
    };

    let bytes = ctx.source.download(url).await?;

    let workspace = ctx
        .runtime
        .temp_dir_in(ctx.layout.root(), WORKSPACE_PREFIX)?;
    let extracted = workspace.path().join(&package.name);
    ctx.extractor.extract(ctx.runtime, &bytes, &extracted)?;

    let (source, dest) = match first_component(ctx, &extracted)? {
        Some(component) => {
            let dest = ctx
                .layout
                .integrations_dir()
                .join(component.file_name().unwrap_or_default());
            (component, dest)
        }
        None if content_in_root(ctx, &extracted, resolution)? => {
            (extracted.clone(), ctx.layout.integrations_dir().join(&package.name))
        }
        None => {
            return Err(PackageError::no_install_target(
                package.to_string(),
                format!("no {} directory and content_in_root is not set", INTEGRATIONS_DIR),
            )
            .into());
        }
    };

    debug!("Installing {:?} as {:?}", source, dest);
    replace_dir(ctx.runtime, &source, &dest)?;
    Ok(dest)
}

fn first_component(ctx: &InstallContext<'_>, extracted: &Path) -> Result<Option<PathBuf>> {
    let components = extracted.join(INTEGRATIONS_DIR);
    if !ctx.runtime.is_dir(&components) {
        return Ok(None);
    }
    Ok(ctx
        .runtime
        .read_dir(&components)?
        .into_iter()
        .find(|entry| ctx.runtime.is_dir(entry)))
}

/// The descriptor inside the snapshot wins over the one fetched during resolution.
fn content_in_root(
    ctx: &InstallContext<'_>,
    extracted: &Path,
    resolution: &Resolution,
) -> Result<bool> {
    let bundled = extracted.join(DESCRIPTOR_FILE);
    if ctx.runtime.exists(&bundled) {
        let descriptor = Descriptor::parse(ctx.runtime.read_to_string(&bundled)?.as_bytes())?;
        return Ok(descriptor.content_in_root);
    }
    Ok(resolution
        .descriptor
        .as_ref()
        .is_some_and(|d| d.content_in_root))
}
