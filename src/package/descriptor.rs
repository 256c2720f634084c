use anyhow::{Context, Result};
use serde::Deserialize;

pub const DESCRIPTOR_FILE: &str = "hacs.json";

/// Optional per-repository metadata naming the artifact and its layout.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_in_root: bool,
}

impl Descriptor {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).with_context(|| format!("Failed to parse {}", DESCRIPTOR_FILE))
    }
}
