use anyhow::{bail, Context, Result};
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::ingest::{IngestConfig, IngestError, IngestPipeline, PendingUpload, UploadFields};
use crate::media::{BlobStore, MetadataExtractor};
use crate::song::{NewSong, Song, SqliteSongStore};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tower_http::services::ServeDir;

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::api_key::require_api_key;
use super::stream_song::stream_song;
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn list_songs(State(song_store): State<GuardedSongStore>) -> Response {
    match song_store.list_songs() {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_song(
    State(song_store): State<GuardedSongStore>,
    Json(new_song): Json<NewSong>,
) -> Response {
    match song_store.create_song(new_song) {
        Ok(song) => {
            info!("Created song {}", song.id);
            (StatusCode::CREATED, Json(song)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn get_song_stats(
    State(song_store): State<GuardedSongStore>,
    State(play_count_store): State<GuardedPlayCountStore>,
    Path(id): Path<String>,
) -> Response {
    if let Err(err) = song_store.get_song(&id) {
        return err.into_response();
    }
    match play_count_store.get_play_count(&id) {
        Ok(play_count) => Json(play_count).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn read_text_field(field: Field<'_>) -> Result<String, IngestError> {
    field
        .text()
        .await
        .map_err(|err| IngestError::InvalidMultipart(err.body_text()))
}

/// Walks the multipart body, storing the `file` part as soon as it shows up.
/// Text parts may come before or after it.
async fn ingest_multipart(
    pipeline: &IngestPipeline,
    mut multipart: Multipart,
) -> Result<Song, IngestError> {
    let mut pending: Option<PendingUpload> = None;
    let mut fields = UploadFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| IngestError::InvalidMultipart(err.body_text()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" if pending.is_none() => {
                let content_type = field.content_type().map(str::to_string);
                let filename = field.file_name().map(str::to_string);
                let reader = StreamReader::new(field.map_err(io::Error::other));
                pending = Some(
                    pipeline
                        .receive(content_type.as_deref(), filename.as_deref(), Box::pin(reader))
                        .await?,
                );
            }
            "title" => fields.title = Some(read_text_field(field).await?),
            "description" => fields.description = Some(read_text_field(field).await?),
            _ => debug!("Ignoring multipart field '{}'", field_name),
        }
    }

    let pending = pending.ok_or(IngestError::MissingFile)?;
    pipeline.finish(pending, fields).await
}

async fn upload_song(
    State(ingest_pipeline): State<GuardedIngestPipeline>,
    multipart: Multipart,
) -> Response {
    match ingest_multipart(&ingest_pipeline, multipart).await {
        Ok(song) => (StatusCode::CREATED, Json(song)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        song_store: GuardedSongStore,
        play_count_store: GuardedPlayCountStore,
        blob_store: BlobStore,
        ingest_pipeline: IngestPipeline,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            song_store,
            play_count_store,
            blob_store,
            ingest_pipeline: Arc::new(ingest_pipeline),
            hash: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

const SONG_ROUTES_PREFIX: &str = "/play";

fn overlaps_song_routes(media_url: &str) -> bool {
    let media_url = media_url.trim_end_matches('/');
    media_url == SONG_ROUTES_PREFIX
        || media_url.starts_with(&format!("{}/", SONG_ROUTES_PREFIX))
}

pub fn make_app(
    config: ServerConfig,
    song_store: GuardedSongStore,
    play_count_store: GuardedPlayCountStore,
    blob_store: BlobStore,
    ingest_config: IngestConfig,
) -> Result<Router> {
    if config.media_url == "/" || !config.media_url.starts_with('/') {
        bail!("Invalid media url {:?}", config.media_url);
    }
    if overlaps_song_routes(&config.media_url) {
        bail!(
            "Media url {:?} overlaps the {} routes",
            config.media_url,
            SONG_ROUTES_PREFIX
        );
    }

    let ingest_pipeline = IngestPipeline::new(
        blob_store.clone(),
        Arc::new(MetadataExtractor::default()),
        song_store.clone(),
        ingest_config,
    );
    let state = ServerState::new(
        config.clone(),
        song_store,
        play_count_store,
        blob_store.clone(),
        ingest_pipeline,
    );

    let app: Router = Router::new()
        .route("/", get(home))
        .route("/play", get(list_songs).post(create_song))
        .route("/play/", get(list_songs).post(create_song))
        .route(
            "/play/upload",
            post(upload_song).layer(DefaultBodyLimit::disable()),
        )
        .route("/play/{id}/stats", get(get_song_stats))
        .route("/play/{id}/stream", get(stream_song))
        .nest_service(&config.media_url, ServeDir::new(blob_store.root()))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state);

    Ok(app)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn run_server(
    config: ServerConfig,
    song_store: SqliteSongStore,
    blob_store: BlobStore,
    ingest_config: IngestConfig,
) -> Result<()> {
    let port = config.port;
    let song_store = Arc::new(song_store);
    let app = make_app(
        config,
        song_store.clone(),
        song_store,
        blob_store,
        ingest_config,
    )?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?)
}
