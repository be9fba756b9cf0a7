use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use rodio::OutputStreamBuilder;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::engine::{DiscontinuityReason, EngineError, EngineEvent, PlayerState};
use crate::library::Track;

use super::sink::{AudioError, Output, Voice};
use super::types::{AudioCmd, PlaybackHandle};

/// How often the thread samples the sink position and checks for track end.
const TICK: Duration = Duration::from_millis(50);

/// `Prev` restarts the current track instead when it has played this long.
pub(super) const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// Where `Prev` goes from queue entry `index` at `position`.
pub(super) fn previous_index(index: usize, position: Duration) -> usize {
    if position > RESTART_THRESHOLD || index == 0 {
        index
    } else {
        index - 1
    }
}

/// Where `Next` or an auto-advance goes; `None` past the last entry.
pub(super) fn next_index(index: usize, len: usize) -> Option<usize> {
    (index + 1 < len).then_some(index + 1)
}

/// Body of the audio thread.
///
/// `OutputStream` is not `Send`, so the stream is opened here and the outcome
/// is reported through `ready` before any command is read.
pub(super) fn run(
    rx: Receiver<AudioCmd>,
    info: PlaybackHandle,
    ready: oneshot::Sender<Result<(), EngineError>>,
) {
    let mut stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "no audio output device");
            let _ = ready.send(Err(EngineError::Unavailable(e.to_string())));
            return;
        }
    };
    // rodio logs to stderr when OutputStream is dropped, which would garble the TUI.
    stream.log_on_drop(false);

    if ready.send(Ok(())).is_err() {
        debug!("connection abandoned before the audio thread was ready");
        return;
    }
    info!("audio thread started");

    let mut player = AudioThread::new(stream, info);
    loop {
        match rx.recv_timeout(TICK) {
            Ok(AudioCmd::Quit) => break,
            Ok(cmd) => player.handle(cmd),
            Err(RecvTimeoutError::Timeout) => player.tick(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    player.stop();
    info!("audio thread stopped");
}

/// Queue and transport state of the audio thread, over any `Output`.
pub(super) struct AudioThread<O: Output> {
    output: O,
    info: PlaybackHandle,
    events: Option<UnboundedSender<EngineEvent>>,
    queue: Vec<Track>,
    index: usize,
    sink: Option<O::Voice>,
    /// Offset of the current voice inside the track; `elapsed()` counts from here.
    base: Duration,
    duration: Duration,
    playing: bool,
    state: PlayerState,
}

impl<O: Output> AudioThread<O> {
    pub(super) fn new(output: O, info: PlaybackHandle) -> Self {
        Self {
            output,
            info,
            events: None,
            queue: Vec::new(),
            index: 0,
            sink: None,
            base: Duration::ZERO,
            duration: Duration::ZERO,
            playing: false,
            state: PlayerState::Idle,
        }
    }

    pub(super) fn handle(&mut self, cmd: AudioCmd) {
        match cmd {
            AudioCmd::Subscribe(tx) => self.events = Some(tx),
            AudioCmd::SetQueue { tracks, start } => {
                self.stop();
                self.index = start.min(tracks.len().saturating_sub(1));
                self.queue = tracks;
                self.set_state(PlayerState::Idle);
            }
            AudioCmd::PrepareAndPlay => {
                if self.load(self.index, Duration::ZERO) {
                    self.resume();
                }
            }
            AudioCmd::Play => self.resume(),
            AudioCmd::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
                self.set_playing(false);
            }
            AudioCmd::Seek(target) => self.seek(target),
            AudioCmd::Next => {
                if let Some(next) = next_index(self.index, self.queue.len()) {
                    self.go_to(next, DiscontinuityReason::Skip);
                }
            }
            AudioCmd::Prev => {
                if self.queue.is_empty() {
                    return;
                }
                let prev = previous_index(self.index, self.position());
                self.go_to(prev, DiscontinuityReason::Skip);
            }
            AudioCmd::Quit => {}
        }
    }

    pub(super) fn tick(&mut self) {
        self.publish();

        let finished = self.playing && self.sink.as_ref().is_some_and(Voice::finished);
        if !finished {
            return;
        }
        match next_index(self.index, self.queue.len()) {
            Some(next) => self.go_to(next, DiscontinuityReason::AutoTransition),
            None => {
                debug!("end of queue");
                self.sink = None;
                self.set_playing(false);
                self.set_state(PlayerState::Ended);
            }
        }
    }

    /// Load queue entry `index` at `start_at`, paused. Returns whether a sink is ready.
    fn load(&mut self, index: usize, start_at: Duration) -> bool {
        let Some(track) = self.queue.get(index).cloned() else {
            return false;
        };
        self.set_state(PlayerState::Buffering);
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        match self.output.load(&track, start_at) {
            Ok((sink, total)) => {
                self.duration =
                    total.unwrap_or_else(|| Duration::from_millis(track.duration_ms));
                self.index = index;
                self.base = start_at;
                self.sink = Some(sink);
                self.publish();
                self.set_state(PlayerState::Ready);
                true
            }
            Err(e) => {
                self.report_load_failure(&e);
                false
            }
        }
    }

    fn report_load_failure(&mut self, error: &AudioError) {
        warn!(error = %error, "could not load track");
        self.duration = Duration::ZERO;
        self.base = Duration::ZERO;
        self.publish();
        self.set_playing(false);
        self.set_state(PlayerState::Idle);
    }

    fn go_to(&mut self, index: usize, reason: DiscontinuityReason) {
        let was_playing = self.playing;
        if !self.load(index, Duration::ZERO) {
            return;
        }
        self.emit(EngineEvent::TrackTransitioned { index });
        self.emit(EngineEvent::PositionDiscontinuity {
            reason,
            position_ms: 0,
        });
        if was_playing || reason == DiscontinuityReason::AutoTransition {
            self.resume();
        }
    }

    fn seek(&mut self, target: Duration) {
        if self.sink.is_none() {
            return;
        }
        let target = if self.duration.is_zero() {
            target
        } else {
            target.min(self.duration)
        };
        let was_playing = self.playing;
        if !self.load(self.index, target) {
            return;
        }
        self.emit(EngineEvent::PositionDiscontinuity {
            reason: DiscontinuityReason::Seek,
            position_ms: target.as_millis() as u64,
        });
        if was_playing {
            self.resume();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
            self.set_playing(true);
        }
    }

    pub(super) fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.base = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.publish();
        self.set_playing(false);
    }

    fn position(&self) -> Duration {
        self.base + self.sink.as_ref().map_or(Duration::ZERO, Voice::elapsed)
    }

    fn publish(&self) {
        let position = self.position();
        if let Ok(mut info) = self.info.lock() {
            info.position = position;
            info.duration = self.duration;
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            self.state = state;
            self.emit(EngineEvent::PlaybackStateChanged(state));
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                debug!("event subscriber gone");
                self.events = None;
            }
        }
    }
}
