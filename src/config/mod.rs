mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "mosic.db";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MEDIA_URL: &str = "/media";

pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/ogg",
    "audio/flac",
    "audio/x-flac",
    "audio/mp4",
    "audio/x-m4a",
    "audio/aac",
    "audio/webm",
    "audio/opus",
];

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub media_root: Option<PathBuf>,
    pub media_url: Option<String>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_mb: Option<u64>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    /// Normalized: leading `/`, no trailing `/`.
    pub media_url: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_bytes: Option<u64>,
    pub allowed_content_types: Vec<String>,
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let media_root = file
            .media_root
            .map(PathBuf::from)
            .or_else(|| cli.media_root.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT));

        let media_url = normalize_media_url(
            file.media_url
                .as_deref()
                .or(cli.media_url.as_deref())
                .unwrap_or(DEFAULT_MEDIA_URL),
        );

        let port = file.port.unwrap_or(cli.port);

        let logging_level = match file.logging_level {
            Some(s) => parse_logging_level(&s)
                .ok_or_else(|| anyhow!("Invalid logging_level {:?} in config file", s))?,
            None => cli.logging_level.clone(),
        };

        let max_upload_bytes = file
            .max_upload_mb
            .or(cli.max_upload_mb)
            .map(|mb| mb.saturating_mul(1024 * 1024));

        let allowed_content_types = file.allowed_content_types.unwrap_or_else(|| {
            DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        let api_key = file
            .api_key
            .or_else(|| cli.api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            db_path,
            media_root,
            media_url,
            port,
            logging_level,
            max_upload_bytes,
            allowed_content_types,
            api_key,
        })
    }
}

/// `"media/"` -> `"/media"`, blank -> [`DEFAULT_MEDIA_URL`].
pub fn normalize_media_url(url: &str) -> String {
    let trimmed = url.trim().trim_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_MEDIA_URL.to_string();
    }
    format!("/{}", trimmed)
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
