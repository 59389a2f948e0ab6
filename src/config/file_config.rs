use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub media_root: Option<String>,
    pub media_url: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub max_upload_mb: Option<u64>,
    pub api_key: Option<String>,

    // Only settable from the file.
    pub allowed_content_types: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
