//! Package model and lifecycle
//!
//! A [`Package`] is one of four variants (integration, plugin, theme, fork) behind
//! a single install / uninstall / update contract. This module also owns the
//! on-disk formats: per-install manifests, the lock file, and the install layout
//! that the [`InstalledIndex`] scans.

mod asset;
mod descriptor;
mod fork;
mod index;
mod integration;
mod layout;
mod lifecycle;
pub mod lock;
pub mod manifest;
mod model;
mod resolver;

pub use descriptor::{DESCRIPTOR_FILE, Descriptor};
pub use fork::PLACEHOLDER_VERSION;
pub use index::InstalledIndex;
pub use layout::{
    DEFAULT_LOCK_FILE, INTEGRATIONS_DIR, InstallLayout, MANIFEST_FILE, MANIFEST_SUFFIX,
    PLUGINS_DIR, THEMES_DIR,
};
pub use lifecycle::InstallContext;
pub use manifest::PackageRecord;
pub use model::{Package, PackageKind, PackageType};
pub use resolver::{
    ArtifactCandidate, DownloadRef, ReleaseResolver, Resolution, candidate_filenames,
    select_release,
};
