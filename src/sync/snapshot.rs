use crate::library::Track;

/// The single UI-facing view of a playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSnapshot {
    /// Connecting to the engine or building the queue.
    Loading,
    /// A track is loaded into the engine.
    Ready(ReadyState),
    /// The session ended with a terminal error; `reason` is user-facing.
    Failed { reason: String },
}

impl PlaybackSnapshot {
    pub fn ready(&self) -> Option<&ReadyState> {
        match self {
            Self::Ready(state) => Some(state),
            Self::Loading | Self::Failed { .. } => None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyState {
    pub current_track: Track,
    pub is_playing: bool,
    /// Engine-reported duration. 0 means not reported yet.
    pub duration_ms: u64,
    pub position_ms: u64,
    /// An optimistic seek is waiting for the engine to confirm it.
    pub is_seeking: bool,
}

impl ReadyState {
    pub fn new(current_track: Track) -> Self {
        Self {
            current_track,
            is_playing: false,
            duration_ms: 0,
            position_ms: 0,
            is_seeking: false,
        }
    }

    pub fn duration_known(&self) -> bool {
        self.duration_ms > 0
    }

    /// Keep a position inside `[0, duration_ms]` once the duration is known.
    pub fn clamp_position(&self, position_ms: u64) -> u64 {
        if self.duration_known() {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        }
    }
}
