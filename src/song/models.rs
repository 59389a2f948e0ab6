use serde::{Deserialize, Serialize};

/// A catalog entry describing one uploaded audio clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Whole seconds, 0 when unknown.
    pub duration: i64,
    pub audio_url: String,
}

/// The caller-provided fields of a song, the id is generated on creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSong {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: i64,
    pub audio_url: String,
}

impl NewSong {
    pub fn with_id(self, id: String) -> Song {
        Song {
            id,
            title: self.title,
            description: self.description,
            duration: self.duration,
            audio_url: self.audio_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCount {
    pub id: String,
    pub count: i64,
}
