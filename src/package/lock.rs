//! Lock file: the declared set of packages, kept sorted so rewrites diff cleanly.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::PackageError;
use crate::github::RepoId;
use crate::runtime::Runtime;

use super::manifest::{PackageRecord, write_replacing};
use super::model::Package;

#[derive(Serialize, Deserialize, Debug, Default)]
struct LockFile {
    #[serde(default, deserialize_with = "null_as_empty")]
    packages: Vec<PackageRecord>,
}

/// `packages:` with nothing after it is YAML null; read it as no packages.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PackageRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PackageRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read the lock file. A missing file is an empty set.
#[tracing::instrument(skip(runtime))]
pub fn read(runtime: &dyn Runtime, path: &Path) -> Result<Vec<Package>> {
    if !runtime.exists(path) {
        debug!("No lock file at {:?}", path);
        return Ok(Vec::new());
    }

    let contents = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read lock file {:?}", path))?;

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records = match serde_yaml::from_str::<LockFile>(&contents) {
        Ok(lock) => lock.packages,
        Err(yaml_err) => {
            debug!("{:?} is not YAML ({}), trying legacy lines", path, yaml_err);
            contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(PackageRecord::from_legacy_line)
                .collect::<Result<Vec<_>, PackageError>>()
                .with_context(|| format!("Failed to parse lock file {:?}", path))?
        }
    };

    records
        .into_iter()
        .map(|record| Package::try_from(record).map_err(Into::into))
        .collect()
}

/// Write `packages` sorted by name (then url), so the same set always produces
/// the same bytes regardless of input order.
#[tracing::instrument(skip(runtime, packages))]
pub fn write(runtime: &dyn Runtime, path: &Path, packages: &[Package]) -> Result<()> {
    let mut sorted: Vec<&Package> = packages.iter().collect();
    sorted.sort_by(|a, b| (&a.name, &a.url).cmp(&(&b.name, &b.url)));

    let lock = LockFile {
        packages: sorted.into_iter().map(PackageRecord::from).collect(),
    };
    let contents = serde_yaml::to_string(&lock).context("Failed to serialize lock file")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        runtime.create_dir_all(parent)?;
    }
    info!("Writing {} package(s) to {:?}", lock.packages.len(), path);
    write_replacing(runtime, path, &contents)
}

/// Insert or replace the entry with the same url.
pub fn upsert(runtime: &dyn Runtime, path: &Path, package: &Package) -> Result<()> {
    let mut packages = read(runtime, path)?;
    packages.retain(|p| p.url != package.url);
    packages.push(package.clone());
    write(runtime, path, &packages)
}

/// Drop the entry with this url. Returns whether one was present.
pub fn remove(runtime: &dyn Runtime, path: &Path, url: &str) -> Result<bool> {
    let mut packages = read(runtime, path)?;
    let url = RepoId::canonical_url(url);
    let before = packages.len();
    packages.retain(|p| p.url != url);
    if packages.len() == before {
        return Ok(false);
    }
    write(runtime, path, &packages)?;
    Ok(true)
}
