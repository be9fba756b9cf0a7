//! Boundary with the playback engine.
//!
//! An engine accepts an ordered queue plus transport commands and reports
//! what actually happened through an event stream on its own schedule. The
//! synchronizer only talks to engines through these traits; `audio` provides
//! the rodio-backed implementation.

use std::future::Future;

use thiserror::Error;

use crate::library::Track;

mod event;
#[cfg(test)]
pub(crate) mod fake;

pub use event::{DiscontinuityReason, EngineEvent, EngineEvents, PlayerState};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Playback engine unavailable: {0}")]
    Unavailable(String),
    #[error("Playback engine went away before the connection completed")]
    Disconnected,
}

/// Something that can hand out an exclusive connection to a playback engine.
pub trait PlaybackEngine: Send + 'static {
    type Connection: EngineConnection;

    fn connect(self) -> impl Future<Output = Result<Self::Connection, EngineError>> + Send;
}

/// An established engine connection, owned by exactly one session.
///
/// Commands are fire-and-forget; their effects come back as `EngineEvent`s.
pub trait EngineConnection: Send + 'static {
    /// Start receiving events. A later call replaces the earlier subscriber;
    /// dropping the receiver unsubscribes.
    fn subscribe(&mut self) -> EngineEvents;

    /// Replace the engine queue. `start_index` is the track to prepare first.
    fn set_queue(&mut self, tracks: &[Track], start_index: usize);
    fn prepare_and_play(&mut self);

    fn play(&mut self);
    fn pause(&mut self);
    /// Absolute seek within the current track.
    fn seek(&mut self, position_ms: u64);
    fn skip_next(&mut self);
    fn skip_previous(&mut self);

    /// Position the engine currently reports for the current track.
    fn current_position_ms(&self) -> u64;
    /// Duration of the current track, 0 while unknown.
    fn duration_ms(&self) -> u64;

    fn disconnect(self);
}
