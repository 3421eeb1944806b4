use serde::{Deserialize, Serialize};

/// A release asset as returned by the releases API
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    /// API URL of the asset; serves the bytes with `Accept: application/octet-stream`
    pub url: String,
    pub browser_download_url: String,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}
