//! Playback state synchronization.
//!
//! A session turns a requested track into a queue handed to the playback
//! engine, then keeps one `PlaybackSnapshot` in step with what the engine
//! reports. Screens only ever read the snapshot and send `PlaybackCommands`.

mod commands;
mod fold;
mod queue;
mod session;
mod snapshot;

pub use commands::PlaybackCommands;
pub use fold::{SyncInput, fold};
pub use queue::Queue;
pub use session::{SessionError, SessionHandle, start};
pub use snapshot::{PlaybackSnapshot, ReadyState};
