use std::sync::Arc;

use crate::library::{Track, TrackId};

/// The ordered, immutable track sequence of one session.
///
/// Its order is exactly the order handed to the engine, so engine indices
/// can be resolved against it directly.
#[derive(Debug, Clone)]
pub struct Queue {
    tracks: Arc<[Track]>,
}

impl Queue {
    /// Build the queue from a catalog listing and locate `requested` in it.
    ///
    /// Returns `None` when the requested track is not part of the listing.
    pub fn build(listing: Vec<Track>, requested: TrackId) -> Option<(Self, usize)> {
        let start = listing.iter().position(|t| t.id == requested)?;
        let queue = Self {
            tracks: listing.into(),
        };
        Some((queue, start))
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
