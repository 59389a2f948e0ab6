use axum::extract::FromRef;

use crate::ingest::IngestPipeline;
use crate::media::BlobStore;
use crate::song::{PlayCountStore, SongStore};
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSongStore = Arc<dyn SongStore>;
pub type GuardedPlayCountStore = Arc<dyn PlayCountStore>;
pub type GuardedIngestPipeline = Arc<IngestPipeline>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub song_store: GuardedSongStore,
    pub play_count_store: GuardedPlayCountStore,
    pub blob_store: BlobStore,
    pub ingest_pipeline: GuardedIngestPipeline,
    pub hash: String,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedSongStore {
    fn from_ref(input: &ServerState) -> Self {
        input.song_store.clone()
    }
}

impl FromRef<ServerState> for GuardedPlayCountStore {
    fn from_ref(input: &ServerState) -> Self {
        input.play_count_store.clone()
    }
}

impl FromRef<ServerState> for BlobStore {
    fn from_ref(input: &ServerState) -> Self {
        input.blob_store.clone()
    }
}

impl FromRef<ServerState> for GuardedIngestPipeline {
    fn from_ref(input: &ServerState) -> Self {
        input.ingest_pipeline.clone()
    }
}
