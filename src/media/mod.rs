mod blob_store;
mod metadata;

pub use blob_store::{BlobStore, BlobStoreError, CHUNK_SIZE};
pub use metadata::{
    ApeReader, AudioMetadata, Id3v1Reader, Id3v2Reader, MetadataExtractor, Mp4Reader,
    RiffInfoReader, TagReader, VorbisCommentsReader,
};
