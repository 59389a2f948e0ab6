//! Best-effort tag reading for uploaded audio.
//!
//! Tag schemes name the same fields differently (ID3 frames, Vorbis comments,
//! MP4 atoms...). lofty maps them onto [`ItemKey`]s; each [`TagReader`] lists
//! which keys carry the title and the description for its scheme, and the
//! extractor asks the readers in priority order.

use anyhow::Result;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag, TagType};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i64>,
}

/// Reads the fields we care about from one tag scheme.
pub trait TagReader: Send + Sync {
    fn tag_type(&self) -> TagType;

    fn title_keys(&self) -> &'static [ItemKey];

    fn description_keys(&self) -> &'static [ItemKey];

    fn read_title(&self, tag: &Tag) -> Option<String> {
        first_text(tag, self.title_keys())
    }

    fn read_description(&self, tag: &Tag) -> Option<String> {
        first_text(tag, self.description_keys())
    }
}

macro_rules! tag_reader {
    ($name:ident, $tag_type:expr, title = $title:expr, description = $description:expr) => {
        pub struct $name;

        impl TagReader for $name {
            fn tag_type(&self) -> TagType {
                $tag_type
            }

            fn title_keys(&self) -> &'static [ItemKey] {
                const KEYS: &[ItemKey] = $title;
                KEYS
            }

            fn description_keys(&self) -> &'static [ItemKey] {
                const KEYS: &[ItemKey] = $description;
                KEYS
            }
        }
    };
}

tag_reader!(
    Id3v2Reader,
    TagType::Id3v2,
    title = &[ItemKey::TrackTitle],
    description = &[ItemKey::Comment, ItemKey::Description]
);
tag_reader!(
    VorbisCommentsReader,
    TagType::VorbisComments,
    title = &[ItemKey::TrackTitle],
    description = &[ItemKey::Comment, ItemKey::Description]
);
tag_reader!(
    Mp4Reader,
    TagType::Mp4Ilst,
    title = &[ItemKey::TrackTitle],
    description = &[ItemKey::Comment, ItemKey::Description]
);
tag_reader!(
    ApeReader,
    TagType::Ape,
    title = &[ItemKey::TrackTitle],
    description = &[ItemKey::Comment]
);
tag_reader!(
    RiffInfoReader,
    TagType::RiffInfo,
    title = &[ItemKey::TrackTitle],
    description = &[ItemKey::Comment]
);
tag_reader!(
    Id3v1Reader,
    TagType::Id3v1,
    title = &[ItemKey::TrackTitle],
    description = &[ItemKey::Comment]
);

/// First non-blank value among `keys`; multi-valued items yield their first value.
fn first_text(tag: &Tag, keys: &[ItemKey]) -> Option<String> {
    keys.iter()
        .filter_map(|key| tag.get_string(key))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Whole seconds rounded to nearest, `None` when the length is unknown.
fn rounded_seconds(duration: Duration) -> Option<i64> {
    if duration.is_zero() {
        return None;
    }
    Some(((duration.as_millis() + 500) / 1000) as i64)
}

fn read_tagged_file(path: &Path) -> Result<TaggedFile> {
    Ok(Probe::open(path)?.guess_file_type()?.read()?)
}

pub struct MetadataExtractor {
    readers: Vec<Box<dyn TagReader>>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Id3v2Reader),
            Box::new(VorbisCommentsReader),
            Box::new(Mp4Reader),
            Box::new(ApeReader),
            Box::new(RiffInfoReader),
            Box::new(Id3v1Reader),
        ])
    }
}

impl MetadataExtractor {
    pub fn new(readers: Vec<Box<dyn TagReader>>) -> Self {
        Self { readers }
    }

    /// Never fails: unreadable or unknown files yield empty metadata.
    pub fn extract(&self, path: &Path) -> AudioMetadata {
        let tagged_file = match read_tagged_file(path) {
            Ok(file) => file,
            Err(err) => {
                debug!("No metadata for {}: {}", path.display(), err);
                return AudioMetadata::default();
            }
        };

        let mut metadata = AudioMetadata {
            duration_seconds: rounded_seconds(tagged_file.properties().duration()),
            ..Default::default()
        };

        for reader in &self.readers {
            let Some(tag) = tagged_file.tag(reader.tag_type()) else {
                continue;
            };
            if metadata.title.is_none() {
                metadata.title = reader.read_title(tag);
            }
            if metadata.description.is_none() {
                metadata.description = reader.read_description(tag);
            }
        }

        metadata
    }
}
