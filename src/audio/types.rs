//! Commands and shared state of the audio thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::engine::EngineEvent;
use crate::library::Track;

#[derive(Debug)]
pub(super) enum AudioCmd {
    /// Route engine events to this sender, replacing the previous one.
    Subscribe(UnboundedSender<EngineEvent>),
    /// Replace the queue. Nothing is loaded until `PrepareAndPlay`.
    SetQueue { tracks: Vec<Track>, start: usize },
    /// Load the current queue entry and start playing it.
    PrepareAndPlay,
    Play,
    Pause,
    /// Absolute seek within the current track.
    Seek(Duration),
    Next,
    Prev,
    /// Release the output stream and end the thread.
    Quit,
}

/// Playback state sampled by the connection without a round trip.
#[derive(Debug, Clone, Default)]
pub(super) struct PlaybackInfo {
    pub position: Duration,
    /// Zero while unknown.
    pub duration: Duration,
}

pub(super) type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
