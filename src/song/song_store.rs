use super::{NewSong, PlayCount, Song};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SongStoreError {
    #[error("Song with id {0} not found")]
    NotFound(String),

    /// The row clashed with an existing one, nothing was written.
    #[error("Failed to persist song {0}")]
    CreateConflict(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for SongStoreError {
    fn from(err: rusqlite::Error) -> Self {
        SongStoreError::Database(err.into())
    }
}

pub type SongStoreResult<T> = Result<T, SongStoreError>;

pub trait SongStore: Send + Sync {
    fn get_song(&self, id: &str) -> SongStoreResult<Song>;

    /// All songs in insertion order.
    fn list_songs(&self) -> SongStoreResult<Vec<Song>>;

    /// Persists a new song under a freshly generated id.
    fn create_song(&self, song: NewSong) -> SongStoreResult<Song>;
}

pub trait PlayCountStore: Send + Sync {
    /// Returns the counter for `id`, creating it at zero when missing.
    fn get_play_count(&self, id: &str) -> SongStoreResult<PlayCount>;

    /// Atomically bumps the counter for `id` and returns the new value.
    fn increment_play_count(&self, id: &str) -> SongStoreResult<i64>;
}
