//! Reconciliation: compare a requested package with what is installed and decide
//! whether an operation has anything to do.

use crate::package::Package;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already in the requested state.
    NoOp,
    /// Install, reinstall, or remove.
    Change,
    /// Refused: the package is present and replacing it was not asked for.
    Conflict,
}

/// `add`: a present url conflicts unless `update` is set; with it, only a
/// differing version is a change.
pub fn plan_add(candidate: &Package, installed: Option<&Package>, update: bool) -> Decision {
    match installed {
        None => Decision::Change,
        Some(_) if !update => Decision::Conflict,
        Some(installed) if installed.version != candidate.version => Decision::Change,
        Some(_) => Decision::NoOp,
    }
}

/// `upgrade`: reinstall exactly when the resolved version is an update.
pub fn plan_upgrade(candidate: &Package, installed: Option<&Package>) -> Decision {
    match installed {
        Some(installed) if installed.version == candidate.version => Decision::NoOp,
        _ => Decision::Change,
    }
}

/// `remove`: absent packages are a no-op, never an error.
pub fn plan_remove(installed: Option<&Package>) -> Decision {
    match installed {
        Some(_) => Decision::Change,
        None => Decision::NoOp,
    }
}
