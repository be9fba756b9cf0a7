use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::sync::{mpsc as tokio_mpsc, oneshot};
use tracing::debug;

use crate::engine::{EngineConnection, EngineError, EngineEvents, PlaybackEngine};
use crate::library::Track;

use super::thread::run;
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo};

/// Local playback through the default audio output device.
///
/// Every connection owns a dedicated audio thread and output stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioEngine;

impl PlaybackEngine for RodioEngine {
    type Connection = RodioConnection;

    async fn connect(self) -> Result<RodioConnection, EngineError> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let info = playback.clone();
        thread::Builder::new()
            .name("segue-audio".to_string())
            .spawn(move || run(rx, info, ready_tx))
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        ready_rx.await.map_err(|_| EngineError::Disconnected)??;
        Ok(RodioConnection { tx, playback })
    }
}

pub struct RodioConnection {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
}

impl RodioConnection {
    fn send(&self, cmd: AudioCmd) {
        if let Err(e) = self.tx.send(cmd) {
            debug!(cmd = ?e.0, "audio thread gone, command dropped");
        }
    }

    fn sample(&self) -> PlaybackInfo {
        self.playback
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }
}

impl EngineConnection for RodioConnection {
    fn subscribe(&mut self) -> EngineEvents {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        self.send(AudioCmd::Subscribe(tx));
        rx
    }

    fn set_queue(&mut self, tracks: &[Track], start_index: usize) {
        self.send(AudioCmd::SetQueue {
            tracks: tracks.to_vec(),
            start: start_index,
        });
    }

    fn prepare_and_play(&mut self) {
        self.send(AudioCmd::PrepareAndPlay);
    }

    fn play(&mut self) {
        self.send(AudioCmd::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCmd::Pause);
    }

    fn seek(&mut self, position_ms: u64) {
        self.send(AudioCmd::Seek(Duration::from_millis(position_ms)));
    }

    fn skip_next(&mut self) {
        self.send(AudioCmd::Next);
    }

    fn skip_previous(&mut self) {
        self.send(AudioCmd::Prev);
    }

    fn current_position_ms(&self) -> u64 {
        self.sample().position.as_millis() as u64
    }

    fn duration_ms(&self) -> u64 {
        self.sample().duration.as_millis() as u64
    }

    fn disconnect(self) {
        self.send(AudioCmd::Quit);
    }
}
