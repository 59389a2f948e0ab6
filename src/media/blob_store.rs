//! Writes uploaded audio into the media root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

/// Size of the buffer used to copy uploads to disk and to stream them back.
pub const CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Uploaded file exceeds allowed size of {0} bytes")]
    TooLarge(u64),

    /// Reading the upload itself failed, e.g. a truncated request body.
    #[error("Failed to read upload: {0}")]
    Source(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat directory of audio files named by random ids.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a stored file by name. Only the last path component of `name`
    /// is used, so the result always lies directly under the media root.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        Path::new(name)
            .file_name()
            .map(|file_name| self.root.join(file_name))
    }

    /// Copies `reader` into a new file and returns its path.
    ///
    /// The copy is aborted as soon as more than `max_bytes` have been written,
    /// whatever length the client announced. On any failure the partial file
    /// is removed before returning.
    pub async fn store<R>(
        &self,
        reader: R,
        filename_hint: Option<&str>,
        max_bytes: Option<u64>,
    ) -> Result<PathBuf, BlobStoreError>
    where
        R: AsyncRead + Unpin,
    {
        fs::create_dir_all(&self.root).await?;
        let destination = self.root.join(random_filename(filename_hint));

        match copy_capped(reader, &destination, max_bytes).await {
            Ok(written) => {
                debug!("Stored {} bytes at {}", written, destination.display());
                Ok(destination)
            }
            Err(err) => {
                self.delete(&destination).await;
                Err(err)
            }
        }
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Deleted {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to delete {}: {}", path.display(), err),
        }
    }
}

async fn copy_capped<R>(
    mut reader: R,
    destination: &Path,
    max_bytes: Option<u64>,
) -> Result<u64, BlobStoreError>
where
    R: AsyncRead + Unpin,
{
    let mut file = fs::File::create(destination).await?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .map_err(BlobStoreError::Source)?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).await?;
        written += read as u64;

        if let Some(max_bytes) = max_bytes {
            if written > max_bytes {
                return Err(BlobStoreError::TooLarge(max_bytes));
            }
        }
    }

    file.flush().await?;
    Ok(written)
}

fn random_filename(filename_hint: Option<&str>) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match filename_hint.and_then(safe_extension) {
        Some(extension) => format!("{}.{}", stem, extension),
        None => stem,
    }
}

fn safe_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
}
