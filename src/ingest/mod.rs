//! Upload ingestion.
//!
//! An upload goes through validate -> store -> extract -> persist. The stored
//! file and the song row are written separately, so every failure after the
//! file hits the disk removes it again. A crash between the two writes can
//! still leave an orphaned file behind.

mod pipeline;

pub use pipeline::{IngestConfig, IngestError, IngestPipeline, PendingUpload, UploadFields};
