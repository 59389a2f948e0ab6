mod models;
mod song_store;
mod sqlite_song_store;

pub use models::{NewSong, PlayCount, Song};
pub use song_store::{PlayCountStore, SongStore, SongStoreError, SongStoreResult};
pub use sqlite_song_store::SqliteSongStore;
