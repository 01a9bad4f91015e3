//! Bean image manifest. The asset pipeline writes `assets/beans.json`; it is
//! embedded at compile time.

use serde::Deserialize;

use crate::error::{Error, Result};

const BUNDLED_MANIFEST: &str = include_str!("../assets/beans.json");

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AssetManifest {
    /// URL prefix shared by every image.
    pub base: String,
    /// Regular images, in pipeline order.
    pub files: Vec<String>,
    /// The rare image.
    pub special: String,
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: AssetManifest = serde_json::from_str(json)?;
        if manifest.files.is_empty() {
            return Err(Error::EmptyAssetList);
        }
        Ok(manifest)
    }

    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_MANIFEST)
    }

    pub fn regular_urls(&self) -> Vec<String> {
        self.files.iter().map(|f| self.join(f)).collect()
    }

    pub fn special_url(&self) -> String {
        self.join(&self.special)
    }

    fn join(&self, file: &str) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), file)
    }
}
