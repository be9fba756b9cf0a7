//! Pure state transitions of the playback snapshot.
//!
//! Every input the session receives (engine events, poll ticks, caller seeks
//! and the seek confirmation deadline) is turned into a `SyncInput` and
//! folded here. Inputs only affect a `Ready` snapshot; against `Loading` or
//! `Failed` they are no-ops.

use tracing::debug;

use crate::engine::DiscontinuityReason;

use super::queue::Queue;
use super::snapshot::PlaybackSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncInput {
    IsPlayingChanged(bool),
    /// The engine reached its ready state and reported this duration.
    Prepared { duration_ms: u64 },
    TrackTransitioned { index: usize },
    Discontinuity {
        reason: DiscontinuityReason,
        position_ms: u64,
    },
    /// Periodic position refresh from the engine.
    PollTick { position_ms: u64 },
    /// Optimistic update for a caller-issued seek.
    SeekRequested { target_ms: u64 },
    /// The engine did not confirm the last seek in time.
    SeekTimedOut,
}

pub fn fold(snapshot: PlaybackSnapshot, input: SyncInput, queue: &Queue) -> PlaybackSnapshot {
    let PlaybackSnapshot::Ready(mut state) = snapshot else {
        return snapshot;
    };

    match input {
        SyncInput::IsPlayingChanged(playing) => state.is_playing = playing,
        SyncInput::Prepared { duration_ms } => {
            state.duration_ms = duration_ms;
            state.position_ms = state.clamp_position(state.position_ms);
        }
        SyncInput::TrackTransitioned { index } => match queue.get(index) {
            Some(track) => state.current_track = track.clone(),
            None => debug!(index, len = queue.len(), "dropping out-of-range transition"),
        },
        SyncInput::Discontinuity {
            reason: DiscontinuityReason::Seek,
            position_ms,
        } => {
            if state.is_seeking {
                state.position_ms = state.clamp_position(position_ms);
                state.is_seeking = false;
            }
        }
        SyncInput::Discontinuity { .. } => {}
        SyncInput::PollTick { position_ms } => {
            // An in-flight seek owns the position until the engine confirms it.
            if !state.is_seeking {
                state.position_ms = state.clamp_position(position_ms);
            }
        }
        SyncInput::SeekRequested { target_ms } => {
            state.is_seeking = true;
            state.position_ms = state.clamp_position(target_ms);
        }
        SyncInput::SeekTimedOut => state.is_seeking = false,
    }

    PlaybackSnapshot::Ready(state)
}
