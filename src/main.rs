use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mosic_server::config::{AppConfig, CliConfig, FileConfig};
use mosic_server::ingest::IngestConfig;
use mosic_server::media::BlobStore;
use mosic_server::server::ServerConfig;
use mosic_server::{run_server, RequestsLoggingLevel, SqliteSongStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file, created if missing.
    #[clap(long, env = "MOSIC_DB_PATH", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Directory uploaded audio files are written to.
    #[clap(long, env = "MOSIC_MEDIA_ROOT", value_parser = parse_path)]
    pub media_root: Option<PathBuf>,

    /// URL prefix under which the media directory is served.
    #[clap(long, env = "MOSIC_MEDIA_URL")]
    pub media_url: Option<String>,

    /// The port to listen on.
    #[clap(short, long, env = "MOSIC_PORT", default_value_t = 8000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Maximum upload size in MiB. Unlimited when omitted.
    #[clap(long, env = "MOSIC_MAX_UPLOAD_MB")]
    pub max_upload_mb: Option<u64>,

    /// Shared secret clients must send in the X-API-Key header.
    #[clap(long, env = "MOSIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            media_root: self.media_root.clone(),
            media_url: self.media_url.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            max_upload_mb: self.max_upload_mb,
            api_key: self.api_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)
        .context("Failed to resolve configuration")?;

    if config.api_key.is_none() {
        tracing::warn!("No API key configured, protected routes will answer 500");
    }

    std::fs::create_dir_all(&config.media_root)
        .with_context(|| format!("Failed to create media root {:?}", config.media_root))?;
    let blob_store = BlobStore::new(&config.media_root);

    info!("Opening SQLite database at {:?}...", config.db_path);
    let song_store = SqliteSongStore::new(&config.db_path)?;

    let ingest_config = IngestConfig {
        allowed_content_types: config.allowed_content_types.clone(),
        max_upload_bytes: config.max_upload_bytes,
        media_url: config.media_url.clone(),
    };
    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        media_url: config.media_url.clone(),
        api_key: config.api_key.clone(),
    };

    info!(
        "Serving {:?} at {} on port {}!",
        config.media_root, config.media_url, config.port
    );
    run_server(server_config, song_store, blob_store, ingest_config).await
}
