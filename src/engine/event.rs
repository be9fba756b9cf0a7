use tokio::sync::mpsc;

/// Coarse engine state, as reported by `PlaybackStateChanged`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing prepared.
    Idle,
    /// Preparing the current track.
    Buffering,
    /// The current track is prepared and its duration is known.
    Ready,
    /// Reached the end of the queue.
    Ended,
}

/// Why the playback position jumped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiscontinuityReason {
    /// An explicit absolute seek was applied.
    Seek,
    /// The previous track ended and the next one started.
    AutoTransition,
    /// A skip command moved to another track or restarted the current one.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    IsPlayingChanged(bool),
    PlaybackStateChanged(PlayerState),
    /// The engine moved to `index` in the queue it was given.
    TrackTransitioned { index: usize },
    PositionDiscontinuity {
        reason: DiscontinuityReason,
        position_ms: u64,
    },
}

pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;
