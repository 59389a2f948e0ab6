use super::RequestsLoggingLevel;
use crate::config::DEFAULT_MEDIA_URL;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// URL prefix the media root is mounted at.
    pub media_url: String,
    /// Expected `X-API-Key` value. Protected routes answer 500 while unset.
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8000,
            media_url: DEFAULT_MEDIA_URL.to_string(),
            api_key: None,
        }
    }
}
