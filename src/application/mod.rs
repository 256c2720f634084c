//! Application layer - Use cases that coordinate the package lifecycle.
//!
//! Each use case looks at the Installed-Package Index, asks the reconciliation
//! rules whether there is anything to do, drives install/uninstall, and keeps
//! the lock file in step with what was changed.

mod add;
mod list;
mod remove;
mod upgrade;

pub use add::{AddOutcome, AddRequest, AddUseCase};
pub use list::ListUseCase;
pub use remove::RemoveUseCase;
pub use upgrade::{PlannedUpgrade, UpgradeUseCase};

use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::package::{InstallContext, Package};

/// Install `package` over `previous`, removing the old artifact when the new one
/// landed somewhere else (a plugin whose file name changed, for example).
async fn install_replacing(
    ctx: &InstallContext<'_>,
    package: &Package,
    previous: Option<&Package>,
) -> Result<PathBuf> {
    let artifact = package.install(ctx).await?;

    if let Some(previous) = previous
        && previous.path.as_ref().is_some_and(|old| *old != artifact)
    {
        debug!("Removing superseded artifact {:?}", previous.path);
        previous.uninstall(ctx.runtime, &ctx.layout)?;
    }

    Ok(artifact)
}

/// Installed packages named by any of `selectors` (repository name or url).
fn select<'p>(installed: &'p [Package], selectors: &[String]) -> Vec<&'p Package> {
    installed
        .iter()
        .filter(|package| selectors.iter().any(|s| package.matches(s)))
        .collect()
}
