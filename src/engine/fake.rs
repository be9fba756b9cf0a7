//! Scripted engine used by tests: records every command and lets the test
//! push events and positions as if they came from a real engine.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::library::{Track, TrackId};

use super::{EngineConnection, EngineError, EngineEvent, EngineEvents, PlaybackEngine, PlayerState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetQueue(Vec<TrackId>, usize),
    PrepareAndPlay,
    Play,
    Pause,
    Seek(u64),
    SkipNext,
    SkipPrevious,
    Disconnect,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<Call>,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
    playing: bool,
    position_ms: u64,
    duration_ms: u64,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    refuse_connection: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose `connect` always fails.
    pub fn unreachable() -> Self {
        Self {
            refuse_connection: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn set_position(&self, position_ms: u64) {
        self.lock().position_ms = position_ms;
    }

    pub fn set_duration(&self, duration_ms: u64) {
        self.lock().duration_ms = duration_ms;
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock()
            .events
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Deliver an event to the current subscriber, if any.
    pub fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.lock().events {
            let _ = tx.send(event);
        }
    }

    fn set_playing(&self, playing: bool) {
        let changed = {
            let mut s = self.lock();
            let changed = s.playing != playing;
            s.playing = playing;
            changed
        };
        if changed {
            self.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }
}

impl PlaybackEngine for FakeEngine {
    type Connection = FakeConnection;

    async fn connect(self) -> Result<FakeConnection, EngineError> {
        if self.refuse_connection {
            return Err(EngineError::Unavailable("refused by test".to_string()));
        }
        Ok(FakeConnection { engine: self })
    }
}

pub struct FakeConnection {
    engine: FakeEngine,
}

impl FakeConnection {
    fn record(&self, call: Call) {
        self.engine.lock().calls.push(call);
    }
}

impl EngineConnection for FakeConnection {
    fn subscribe(&mut self) -> EngineEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.engine.lock().events = Some(tx);
        rx
    }

    fn set_queue(&mut self, tracks: &[Track], start_index: usize) {
        self.record(Call::SetQueue(
            tracks.iter().map(|t| t.id).collect(),
            start_index,
        ));
    }

    fn prepare_and_play(&mut self) {
        self.record(Call::PrepareAndPlay);
        self.engine
            .emit(EngineEvent::PlaybackStateChanged(PlayerState::Ready));
        self.engine.set_playing(true);
    }

    fn play(&mut self) {
        self.record(Call::Play);
        self.engine.set_playing(true);
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
        self.engine.set_playing(false);
    }

    fn seek(&mut self, position_ms: u64) {
        self.record(Call::Seek(position_ms));
    }

    fn skip_next(&mut self) {
        self.record(Call::SkipNext);
    }

    fn skip_previous(&mut self) {
        self.record(Call::SkipPrevious);
    }

    fn current_position_ms(&self) -> u64 {
        self.engine.lock().position_ms
    }

    fn duration_ms(&self) -> u64 {
        self.engine.lock().duration_ms
    }

    fn disconnect(self) {
        self.record(Call::Disconnect);
        self.engine.lock().events = None;
    }
}
