use anyhow::Result;
use std::path::Path;

use crate::package::{InstallLayout, InstalledIndex, Package, lock};
use crate::runtime::Runtime;

pub struct ListUseCase<'a> {
    runtime: &'a dyn Runtime,
    layout: &'a InstallLayout,
}

impl<'a> ListUseCase<'a> {
    pub fn new(runtime: &'a dyn Runtime, layout: &'a InstallLayout) -> Self {
        Self { runtime, layout }
    }

    /// Installed packages, sorted by name.
    pub fn installed(&self) -> Result<Vec<Package>> {
        let mut packages = InstalledIndex::new(self.runtime, self.layout).scan()?;
        packages.sort_by(|a, b| (&a.name, &a.url).cmp(&(&b.name, &b.url)));
        Ok(packages)
    }

    /// Write the installed set to the lock file. Returns what was written.
    pub fn freeze(&self, lock_path: &Path) -> Result<Vec<Package>> {
        let packages = self.installed()?;
        lock::write(self.runtime, lock_path, &packages)?;
        Ok(packages)
    }
}
