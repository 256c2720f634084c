use anyhow::Result;
use log::{debug, info, warn};
use std::path::Path;

use crate::package::{InstallContext, Package, lock};
use crate::reconcile::{Decision, plan_upgrade};

use super::{install_replacing, select};

/// An installed package and the newer release it would move to.
#[derive(Debug, Clone)]
pub struct PlannedUpgrade {
    pub installed: Package,
    pub target: Package,
}

pub struct UpgradeUseCase<'a> {
    ctx: &'a InstallContext<'a>,
    lock_path: &'a Path,
}

impl<'a> UpgradeUseCase<'a> {
    pub fn new(ctx: &'a InstallContext<'a>, lock_path: &'a Path) -> Self {
        Self { ctx, lock_path }
    }

    /// Re-resolve installed packages (all of them, or those named by `selectors`)
    /// to their latest version and keep the ones that would change.
    #[tracing::instrument(skip(self))]
    pub async fn plan(&self, selectors: &[String]) -> Result<Vec<PlannedUpgrade>> {
        let installed = self.ctx.index().scan()?;
        let candidates: Vec<&Package> = if selectors.is_empty() {
            installed.iter().collect()
        } else {
            let selected = select(&installed, selectors);
            for selector in selectors {
                if !selected.iter().any(|p| p.matches(selector)) {
                    warn!("{} is not installed", selector);
                }
            }
            selected
        };

        let mut plan = Vec::new();
        for installed in candidates {
            let target = Package::resolve(
                &installed.url,
                None,
                installed.kind.clone(),
                &installed.ignored_versions,
                self.ctx.source,
            )
            .await?;

            match plan_upgrade(&target, Some(installed)) {
                Decision::Change => plan.push(PlannedUpgrade {
                    installed: installed.clone(),
                    target,
                }),
                _ => debug!("{} is up to date", installed),
            }
        }
        Ok(plan)
    }

    /// Install each planned target and record it in the lock file.
    #[tracing::instrument(skip(self, plan))]
    pub async fn apply(&self, plan: &[PlannedUpgrade]) -> Result<()> {
        for upgrade in plan {
            install_replacing(self.ctx, &upgrade.target, Some(&upgrade.installed)).await?;
            lock::upsert(self.ctx.runtime, self.lock_path, &upgrade.target)?;
            info!("Upgraded {} to {}", upgrade.installed, upgrade.target.version);
        }
        Ok(())
    }
}
