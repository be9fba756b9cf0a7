use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable catalog identifier of a track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An imported track as stored in the catalog. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Duration read at import time; 0 when the tags did not carry one.
    pub duration_ms: u64,
    /// Opaque locator handed to the playback engine (a file path for rodio).
    pub source: String,
}

/// A track produced by the import step, before the catalog assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub source: String,
}

impl NewTrack {
    pub(crate) fn with_id(self, id: TrackId) -> Track {
        Track {
            id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            duration_ms: self.duration_ms,
            source: self.source,
        }
    }
}
