//! rodio-backed playback engine.
//!
//! Commands travel over a std channel to a dedicated audio thread that owns
//! the output stream and the current sink. The thread samples the position
//! into a shared `PlaybackInfo` and reports state changes as engine events.

mod player;
mod sink;
mod thread;
mod types;

pub use player::{RodioConnection, RodioEngine};
pub use sink::AudioError;
