//! Audio streaming functionality

use super::state::{GuardedPlayCountStore, GuardedSongStore};
use crate::media::{BlobStore, CHUNK_SIZE};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::io::ErrorKind;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

/// Streams the song's file in fixed-size chunks and counts one play.
///
/// The play is counted once the file is known to be readable, before the
/// first byte goes out, so an interrupted download still counts.
pub async fn stream_song(
    State(song_store): State<GuardedSongStore>,
    State(play_count_store): State<GuardedPlayCountStore>,
    State(blob_store): State<BlobStore>,
    Path(id): Path<String>,
) -> Response {
    let song = match song_store.get_song(&id) {
        Ok(song) => song,
        Err(err) => return err.into_response(),
    };

    let path = match blob_store.path_for(&song.audio_url) {
        Some(path) => path,
        None => {
            warn!("Song {} has unusable audio_url {}", id, song.audio_url);
            return StatusCode::NOT_FOUND.into_response();
        }
    };
    debug!("Streaming song {} from path {}", id, path.display());

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("Audio file for song {} is missing: {}", id, path.display());
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(err) => {
            error!("Failed to open {}: {}", path.display(), err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let file_length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            error!("Failed to stat {}: {}", path.display(), err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match play_count_store.increment_play_count(&id) {
        Ok(count) => debug!("Song {} played {} times", id, count),
        Err(err) => return err.into_response(),
    }

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.to_string())
        .header(header::CONTENT_LENGTH, file_length)
        .body(Body::from_stream(stream))
        .unwrap_or_else(|err| {
            error!("Failed to build stream response: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}
