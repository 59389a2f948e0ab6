use anyhow::anyhow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

use crate::media::{AudioMetadata, BlobStore, BlobStoreError, MetadataExtractor};
use crate::song::{NewSong, Song, SongStore, SongStoreError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("No file provided")]
    MissingFile,

    #[error("Malformed multipart body: {0}")]
    InvalidMultipart(String),

    #[error("Uploaded file exceeds allowed size of {0} bytes")]
    TooLarge(u64),

    #[error("Failed to persist song {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<BlobStoreError> for IngestError {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::TooLarge(max) => IngestError::TooLarge(max),
            BlobStoreError::Source(err) => IngestError::InvalidMultipart(err.to_string()),
            BlobStoreError::Io(err) => IngestError::Internal(err.into()),
        }
    }
}

impl From<SongStoreError> for IngestError {
    fn from(err: SongStoreError) -> Self {
        match err {
            SongStoreError::CreateConflict(id) => IngestError::Conflict(id),
            SongStoreError::NotFound(id) => IngestError::Internal(anyhow!("Song {} not found", id)),
            SongStoreError::Database(err) => IngestError::Internal(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// MIME essences accepted for uploads, lowercase.
    pub allowed_content_types: Vec<String>,
    pub max_upload_bytes: Option<u64>,
    /// URL prefix under which stored files are published, e.g. `/media`.
    pub media_url: String,
}

/// Caller-supplied text fields of an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadFields {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A stored upload whose song row does not exist yet.
///
/// Dropping it without [`PendingUpload::disarm`] deletes the file, which
/// covers requests that are aborted between storing and persisting.
#[derive(Debug)]
pub struct PendingUpload {
    path: PathBuf,
    original_filename: Option<String>,
    armed: bool,
}

impl PendingUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn stored_filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!("Removed abandoned upload {}", self.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => error!(
                "Failed to remove abandoned upload {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn content_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Tags win for title and duration, the caller wins for the description.
fn resolve_song(
    metadata: AudioMetadata,
    fields: UploadFields,
    original_filename: Option<&str>,
    stored_filename: &str,
    media_url: &str,
) -> NewSong {
    let fallback_name = non_blank(original_filename).unwrap_or(stored_filename);
    let stem = Path::new(fallback_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback_name.to_string());

    let title = metadata
        .title
        .or_else(|| non_blank(fields.title.as_deref()).map(str::to_string))
        .unwrap_or(stem);
    let description = non_blank(fields.description.as_deref())
        .map(str::to_string)
        .or(metadata.description);

    NewSong {
        title,
        description,
        duration: metadata.duration_seconds.unwrap_or(0),
        audio_url: format!("{}/{}", media_url, stored_filename),
    }
}

pub struct IngestPipeline {
    blob_store: BlobStore,
    extractor: Arc<MetadataExtractor>,
    song_store: Arc<dyn SongStore>,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(
        blob_store: BlobStore,
        extractor: Arc<MetadataExtractor>,
        song_store: Arc<dyn SongStore>,
        mut config: IngestConfig,
    ) -> Self {
        config.allowed_content_types = config
            .allowed_content_types
            .iter()
            .map(|ct| content_type_essence(ct))
            .collect();
        Self {
            blob_store,
            extractor,
            song_store,
            config,
        }
    }

    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        content_type
            .map(content_type_essence)
            .is_some_and(|essence| self.config.allowed_content_types.contains(&essence))
    }

    /// Validates the declared content type and writes the bytes to the media root.
    ///
    /// The content type is checked before anything is read from `reader`.
    pub async fn receive<R>(
        &self,
        content_type: Option<&str>,
        filename: Option<&str>,
        reader: R,
    ) -> Result<PendingUpload, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        if !self.accepts(content_type) {
            return Err(IngestError::UnsupportedContentType(
                content_type.unwrap_or("none").to_string(),
            ));
        }

        let path = self
            .blob_store
            .store(reader, filename, self.config.max_upload_bytes)
            .await?;
        debug!("Received upload {:?} into {}", filename, path.display());

        Ok(PendingUpload {
            path,
            original_filename: filename.map(str::to_string),
            armed: true,
        })
    }

    /// Extracts metadata and persists the song, deleting the file if that fails.
    pub async fn finish(
        &self,
        pending: PendingUpload,
        fields: UploadFields,
    ) -> Result<Song, IngestError> {
        let path = pending.path().to_path_buf();
        let extractor = self.extractor.clone();
        let metadata = match tokio::task::spawn_blocking(move || extractor.extract(&path)).await
        {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    "Metadata extraction for {} did not complete: {}",
                    pending.path().display(),
                    err
                );
                AudioMetadata::default()
            }
        };

        let new_song = resolve_song(
            metadata,
            fields,
            pending.original_filename.as_deref(),
            &pending.stored_filename(),
            &self.config.media_url,
        );

        match self.song_store.create_song(new_song) {
            Ok(song) => {
                let path = pending.disarm();
                info!("Ingested song {} from {}", song.id, path.display());
                Ok(song)
            }
            Err(err) => {
                let path = pending.disarm();
                error!("Failed to persist song for {}: {}", path.display(), err);
                self.blob_store.delete(&path).await;
                Err(err.into())
            }
        }
    }

    /// Runs the whole pipeline over a single reader.
    pub async fn ingest<R>(
        &self,
        content_type: Option<&str>,
        filename: Option<&str>,
        reader: R,
        fields: UploadFields,
    ) -> Result<Song, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let pending = self.receive(content_type, filename, reader).await?;
        self.finish(pending, fields).await
    }
}
