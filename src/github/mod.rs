//! Source-host access: releases API, branch heads, raw files and archives.

mod client;
mod endpoints;
mod repo;
mod types;

pub use client::{GitHub, ReleaseSource};
pub use endpoints::{DEFAULT_API_URL, DEFAULT_RAW_URL, DEFAULT_WEB_URL, Endpoints};
pub use repo::RepoId;
pub use types::{Branch, BranchCommit, Release, ReleaseAsset};

#[cfg(test)]
pub use client::MockReleaseSource;
