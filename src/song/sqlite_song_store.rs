use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};
use anyhow::{anyhow, Context};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::{NewSong, PlayCount, PlayCountStore, Song, SongStore, SongStoreError, SongStoreResult};

/// How long a writer waits on a lock held by another connection before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SONGS_TABLE_V_0: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("duration", &SqlType::Integer, non_null = true),
        sqlite_column!("audio_url", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const PLAY_COUNTS_TABLE_V_0: Table = Table {
    name: "play_counts",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!(
            "count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[],
};

const SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[SONGS_TABLE_V_0, PLAY_COUNTS_TABLE_V_0],
};

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn song_from_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        duration: row.get(3)?,
        audio_url: row.get(4)?,
    })
}

/// Song catalog and play counters backed by a single SQLite connection.
#[derive(Clone)]
pub struct SqliteSongStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSongStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref();
        let is_new = !db_path.exists();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        if is_new {
            info!("Creating song database at {:?}", db_path);
            SCHEMA.create(&conn)?;
        } else {
            SCHEMA
                .validate(&conn)
                .with_context(|| format!("Invalid song database at {:?}", db_path))?;
        }

        Ok(SqliteSongStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> SongStoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SongStoreError::Database(anyhow!("Song database lock poisoned")))
    }

    /// Inserts a fully formed song in its own transaction.
    ///
    /// A clash on the id rolls back and yields [`SongStoreError::CreateConflict`].
    pub fn insert_song(&self, song: &Song) -> SongStoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            &format!(
                "INSERT INTO {} (id, title, description, duration, audio_url) VALUES (?1, ?2, ?3, ?4, ?5)",
                SONGS_TABLE_V_0.name
            ),
            params![
                song.id,
                song.title,
                song.description,
                song.duration,
                song.audio_url
            ],
        );

        match inserted {
            Ok(_) => {
                tx.commit()?;
                Ok(())
            }
            Err(err) if is_constraint_violation(&err) => {
                debug!("Song {} clashes with an existing row: {}", song.id, err);
                Err(SongStoreError::CreateConflict(song.id.clone()))
            }
            Err(err) => Err(SongStoreError::Database(
                anyhow::Error::new(err).context(format!("Failed to insert song {}", song.id)),
            )),
        }
    }
}

impl SongStore for SqliteSongStore {
    fn get_song(&self, id: &str) -> SongStoreResult<Song> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT id, title, description, duration, audio_url FROM {} WHERE id = ?1",
                SONGS_TABLE_V_0.name
            ),
            params![id],
            song_from_row,
        )
        .optional()?
        .ok_or_else(|| SongStoreError::NotFound(id.to_string()))
    }

    fn list_songs(&self) -> SongStoreResult<Vec<Song>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title, description, duration, audio_url FROM {} ORDER BY rowid",
            SONGS_TABLE_V_0.name
        ))?;
        let songs = stmt
            .query_map([], song_from_row)?
            .collect::<Result<Vec<Song>, _>>()?;
        Ok(songs)
    }

    fn create_song(&self, song: NewSong) -> SongStoreResult<Song> {
        let song = song.with_id(Uuid::new_v4().to_string());
        self.insert_song(&song)?;
        debug!("Created song {} ({})", song.id, song.title);
        Ok(song)
    }
}

impl PlayCountStore for SqliteSongStore {
    fn get_play_count(&self, id: &str) -> SongStoreResult<PlayCount> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (id, count) VALUES (?1, 0)",
                PLAY_COUNTS_TABLE_V_0.name
            ),
            params![id],
        )?;
        let count = tx.query_row(
            &format!(
                "SELECT count FROM {} WHERE id = ?1",
                PLAY_COUNTS_TABLE_V_0.name
            ),
            params![id],
            |row| row.get::<_, i64>(0),
        )?;
        tx.commit()?;

        Ok(PlayCount {
            id: id.to_string(),
            count,
        })
    }

    fn increment_play_count(&self, id: &str) -> SongStoreResult<i64> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the database write lock before the read, so no other
        // connection can interleave between the read and the write below.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = tx
            .query_row(
                &format!(
                    "SELECT count FROM {} WHERE id = ?1",
                    PLAY_COUNTS_TABLE_V_0.name
                ),
                params![id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        let new_count = match current {
            None => {
                tx.execute(
                    &format!(
                        "INSERT INTO {} (id, count) VALUES (?1, 1)",
                        PLAY_COUNTS_TABLE_V_0.name
                    ),
                    params![id],
                )?;
                1
            }
            Some(count) => {
                tx.execute(
                    &format!(
                        "UPDATE {} SET count = ?1 WHERE id = ?2",
                        PLAY_COUNTS_TABLE_V_0.name
                    ),
                    params![count + 1, id],
                )?;
                count + 1
            }
        };
        tx.commit()?;
        Ok(new_count)
    }
}
