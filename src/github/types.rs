use serde::{Deserialize, Serialize};

/// Represents a GitHub release asset
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Represents a GitHub release. Only the consumed fields are kept.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub zipball_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Linear scan for an asset with exactly this file name.
    pub fn find_asset(&self, filename: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == filename)
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BranchCommit {
    pub sha: String,
}
