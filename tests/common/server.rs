//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own database and media root.

#![allow(dead_code)]

use super::constants::*;
use mosic_server::config::DEFAULT_ALLOWED_CONTENT_TYPES;
use mosic_server::ingest::IngestConfig;
use mosic_server::media::BlobStore;
use mosic_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use mosic_server::SqliteSongStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Knobs for tests that need a non-default server
#[derive(Debug, Clone)]
pub struct TestServerOptions {
    pub api_key: Option<String>,
    pub max_upload_bytes: Option<u64>,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            api_key: Some(TEST_API_KEY.to_string()),
            max_upload_bytes: Some(TEST_MAX_UPLOAD_BYTES),
        }
    }
}

/// Test server instance with isolated database and media root
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Directory uploads land in
    pub media_root: PathBuf,

    /// Song store for direct database access in tests
    pub store: Arc<SqliteSongStore>,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with default options
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created, the port cannot be bound or
    /// the server does not become ready within the timeout.
    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let media_root = temp_dir.path().join("media");
        std::fs::create_dir_all(&media_root).expect("Failed to create media root");

        let store = Arc::new(
            SqliteSongStore::new(temp_dir.path().join("mosic.db"))
                .expect("Failed to open song store"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            api_key: options.api_key,
            ..Default::default()
        };
        let ingest_config = IngestConfig {
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: options.max_upload_bytes,
            media_url: config.media_url.clone(),
        };

        let app = make_app(
            config,
            store.clone(),
            store.clone(),
            BlobStore::new(&media_root),
            ingest_config,
        )
        .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            media_root,
            store,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Files currently stored in the media root
    pub fn media_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.media_root)
            .expect("Failed to read media root")
            .map(|entry| entry.expect("Failed to read dir entry").path())
            .collect()
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            // Servers spawned without a key answer 500 here, which still means ready.
            match client
                .get(format!("{}/", self.base_url))
                .header("X-API-Key", TEST_API_KEY)
                .send()
                .await
            {
                Ok(_) => return,
                Err(_) => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
