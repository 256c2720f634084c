use anyhow::Result;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::PackageError;
use crate::package::{InstallContext, Package, PackageKind, lock};
use crate::reconcile::{Decision, plan_add};

use super::install_replacing;

/// A user request to add one package.
#[derive(Debug, Clone)]
pub struct AddRequest {
    pub url: String,
    /// Exact tag (or commit for forks); latest when `None`.
    pub version: Option<String>,
    pub kind: PackageKind,
    /// Replace an existing install instead of refusing.
    pub update: bool,
    /// Tags never picked as the latest release for this package.
    pub ignored_versions: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Installed(Package),
    Unchanged(Package),
}

pub struct AddUseCase<'a> {
    ctx: &'a InstallContext<'a>,
    lock_path: &'a Path,
}

impl<'a> AddUseCase<'a> {
    pub fn new(ctx: &'a InstallContext<'a>, lock_path: &'a Path) -> Self {
        Self { ctx, lock_path }
    }

    /// Resolve and install one package, then record it in the lock file.
    ///
    /// An already installed url is refused before anything is fetched unless
    /// `update` is set.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, request: &AddRequest) -> Result<AddOutcome> {
        let wanted = Package::new(&request.url, "", request.kind.clone())?;
        let installed = self.ctx.index().find(&wanted.url)?;

        if let Some(installed) = &installed
            && !request.update
        {
            return Err(already_installed(installed).into());
        }

        let package = Package::resolve(
            &wanted.url,
            request.version.as_deref(),
            request.kind.clone(),
            &request.ignored_versions,
            self.ctx.source,
        )
        .await?;

        self.apply(package, installed.as_ref(), request.update)
            .await
    }

    /// Install every entry of a lock file. Entries already installed at the same
    /// version are left alone; a differing installed version needs `update`.
    /// Conflicts are reported before anything is changed.
    #[tracing::instrument(skip(self, packages))]
    pub async fn add_all(&self, packages: Vec<Package>, update: bool) -> Result<Vec<AddOutcome>> {
        let installed = self.ctx.index().scan()?;
        let find = |package: &Package| installed.iter().find(|p| p.url == package.url);

        if !update {
            for package in &packages {
                if let Some(present) = find(package)
                    && present.version != package.version
                {
                    return Err(already_installed(present).into());
                }
            }
        }

        let mut outcomes = Vec::with_capacity(packages.len());
        for package in packages {
            let previous = find(&package);
            if previous.is_some_and(|p| p.version == package.version) {
                info!("{} is already installed", package);
                lock::upsert(self.ctx.runtime, self.lock_path, &package)?;
                outcomes.push(AddOutcome::Unchanged(package));
                continue;
            }
            outcomes.push(self.apply(package, previous, true).await?);
        }
        Ok(outcomes)
    }

    async fn apply(
        &self,
        package: Package,
        installed: Option<&Package>,
        update: bool,
    ) -> Result<AddOutcome> {
        match plan_add(&package, installed, update) {
            Decision::Conflict => {
                let installed = installed.unwrap_or(&package);
                Err(already_installed(installed).into())
            }
            Decision::NoOp => {
                warn!("{} is already installed at this version", package);
                lock::upsert(self.ctx.runtime, self.lock_path, &package)?;
                Ok(AddOutcome::Unchanged(package))
            }
            Decision::Change => {
                install_replacing(self.ctx, &package, installed).await?;
                lock::upsert(self.ctx.runtime, self.lock_path, &package)?;
                Ok(AddOutcome::Installed(package))
            }
        }
    }
}

fn already_installed(installed: &Package) -> PackageError {
    PackageError::AlreadyInstalled {
        package: installed.name.clone(),
        version: installed.version.clone(),
    }
}
