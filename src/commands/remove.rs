use anyhow::Result;
use log::debug;

use crate::application::RemoveUseCase;
use crate::package::Package;
use crate::runtime::Runtime;

use super::config::Config;

/// Remove packages selected by repository name or url
#[tracing::instrument(skip(runtime, config))]
pub fn remove<R: Runtime>(
    runtime: R,
    config: Config,
    selectors: &[String],
    yes: bool,
) -> Result<()> {
    let layout = config.layout();
    let use_case = RemoveUseCase::new(&runtime, &layout, &config.lock_path);

    let plan = use_case.plan(selectors)?;
    debug!("{} package(s) selected for removal", plan.len());

    if plan.is_empty() {
        println!("No matching packages installed.");
        return Ok(());
    }

    if !yes {
        show_removal_plan(&plan);
        if !runtime.confirm("Proceed with removal?")? {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    use_case.remove(&plan)?;
    for package in &plan {
        println!("Removed {}", package);
    }

    Ok(())
}

fn show_removal_plan(plan: &[Package]) {
    println!();
    println!("=== Removal Plan ===");
    println!();
    for package in plan {
        match &package.path {
            Some(path) => println!("  [DEL] {} ({})", package, path.display()),
            None => println!("  [DEL] {}", package),
        }
    }
    println!();
}
