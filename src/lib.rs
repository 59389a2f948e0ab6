//! Mosic Server Library
//!
//! Audio upload and streaming service. Modules are exposed for the binary and
//! for the end-to-end tests.

pub mod config;
pub mod ingest;
pub mod media;
pub mod server;
pub mod song;
pub mod sqlite_persistence;

pub use server::{run_server, RequestsLoggingLevel};
pub use song::{SongStore, SqliteSongStore};
