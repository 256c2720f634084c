use anyhow::{Context, Result, anyhow};
use log::debug;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::PackageError;
use crate::runtime::Runtime;

use super::layout::WORKSPACE_PREFIX;
use super::lifecycle::{InstallContext, replace_dir};
use super::model::Package;
use super::resolver::{DownloadRef, Resolution};

/// Directory of built-in components inside a platform source tree.
const COMPONENTS_DIR: &str = "homeassistant/components";
/// Version stamped into the component's own manifest so the platform loads it.
pub const PLACEHOLDER_VERSION: &str = "0.0.0";

/// Install one component out of a branch snapshot of a platform fork.
pub(super) async fn install(
    ctx: &InstallContext<'_>,
    package: &Package,
    fork_component: &str,
    resolution: &Resolution,
) -> Result<PathBuf> {
    let DownloadRef::Archive(url) = &resolution.download else {
        return Err(anyhow!("{} does not resolve to a branch archive", package));
    };

    let bytes = ctx.source.download(url).await?;

    let workspace = ctx
        .runtime
        .temp_dir_in(ctx.layout.root(), WORKSPACE_PREFIX)?;
    let extracted = workspace.path().join(&package.name);
    ctx.extractor.extract(ctx.runtime, &bytes, &extracted)?;

    let source = extracted.join(COMPONENTS_DIR).join(fork_component);
    if !ctx.runtime.is_dir(&source) {
        return Err(PackageError::no_install_target(
            package.to_string(),
            format!("{}/{} not found in {}", COMPONENTS_DIR, fork_component, url),
        )
        .into());
    }

    stamp_version(ctx.runtime, &source.join("manifest.json"))?;

    let dest = ctx.layout.integrations_dir().join(fork_component);
    debug!("Installing {:?} as {:?}", source, dest);
    replace_dir(ctx.runtime, &source, &dest)?;
    Ok(dest)
}

/// Set `"version"` in a component manifest, keeping every other field.
fn stamp_version(runtime: &dyn Runtime, manifest: &Path) -> Result<()> {
    let contents = runtime
        .read_to_string(manifest)
        .with_context(|| format!("Failed to read component manifest {:?}", manifest))?;
    let mut value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse component manifest {:?}", manifest))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("Component manifest {:?} is not a JSON object", manifest))?;
    object.insert("version".to_string(), Value::from(PLACEHOLDER_VERSION));

    runtime.write(manifest, serde_json::to_string_pretty(&value)?.as_bytes())
}
