//! One playback session: the task that owns the engine connection and is the
//! only writer of the snapshot.
//!
//! Engine events, caller commands, the position poll and the seek
//! confirmation deadline are multiplexed in a single `select!` loop, so every
//! mutation of the snapshot is serialized through `Synchronizer::apply`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SyncSettings;
use crate::engine::{
    DiscontinuityReason, EngineConnection, EngineError, EngineEvent, PlaybackEngine, PlayerState,
};
use crate::library::{Catalog, CatalogError, TrackId};

use super::commands::{PlaybackCommands, SessionCmd, Transport};
use super::fold::{SyncInput, fold};
use super::queue::Queue;
use super::snapshot::{PlaybackSnapshot, ReadyState};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to connect to the playback engine: {0}")]
    Connection(#[from] EngineError),
    #[error("Failed to read the track catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Track {0} is not in the catalog")]
    TrackNotFound(TrackId),
}

impl SessionError {
    /// Short user-facing reason shown in a `Failed` snapshot.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection error",
            Self::Catalog(_) => "catalog error",
            Self::TrackNotFound(_) => "track not found",
        }
    }
}

/// Owner side of a running session.
///
/// Dropping the handle tears the session down; `shutdown` does the same and
/// waits until the engine connection has been released.
pub struct SessionHandle {
    track_id: TrackId,
    tx: Option<mpsc::UnboundedSender<SessionCmd>>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// The track the session was started for.
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    pub fn commands(&self) -> PlaybackCommands {
        self.tx
            .clone()
            .map(PlaybackCommands::new)
            .unwrap_or_default()
    }

    pub async fn shutdown(mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(SessionCmd::Shutdown(ack_tx)).is_ok() {
            // An error here means the task already ended on its own.
            let _ = ack_rx.await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "playback session task did not finish cleanly");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let (ack_tx, _) = oneshot::channel();
            let _ = tx.send(SessionCmd::Shutdown(ack_tx));
        }
    }
}

/// Start a session for `track_id` on the current tokio runtime.
pub fn start<E: PlaybackEngine>(
    engine: E,
    catalog: Arc<dyn Catalog>,
    track_id: TrackId,
    settings: &SyncSettings,
) -> SessionHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::Loading);

    let sync = Synchronizer {
        catalog,
        track_id,
        poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
        seek_timeout: (settings.seek_confirm_timeout_ms > 0)
            .then(|| Duration::from_millis(settings.seek_confirm_timeout_ms)),
        snapshot: snapshot_tx,
        commands: cmd_rx,
        seek_deadline: None,
        pending_seeks: 0,
    };
    let task = tokio::spawn(sync.run(engine));

    SessionHandle {
        track_id,
        tx: Some(cmd_tx),
        snapshot: snapshot_rx,
        task: Some(task),
    }
}

struct Synchronizer {
    catalog: Arc<dyn Catalog>,
    track_id: TrackId,
    poll_interval: Duration,
    seek_timeout: Option<Duration>,
    snapshot: watch::Sender<PlaybackSnapshot>,
    commands: mpsc::UnboundedReceiver<SessionCmd>,
    seek_deadline: Option<Instant>,
    /// Seeks forwarded to the engine and not yet confirmed. Only the
    /// confirmation of the last one may settle the snapshot.
    pending_seeks: usize,
}

impl Synchronizer {
    async fn run<E: PlaybackEngine>(mut self, engine: E) {
        info!(track = %self.track_id, "playback session starting");

        let connected = tokio::select! {
            res = engine.connect() => res,
            ack = self.wait_for_shutdown() => {
                debug!("session torn down while connecting");
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
                return;
            }
        };

        let mut conn = match connected {
            Ok(conn) => conn,
            Err(e) => {
                self.fail(SessionError::from(e));
                return;
            }
        };

        let mut events = conn.subscribe();

        let queue = match self.resolve_queue() {
            Ok((queue, start)) => {
                conn.set_queue(queue.tracks(), start);
                conn.prepare_and_play();
                let track = queue.tracks()[start].clone();
                info!(track = %track.id, title = %track.title, queue = queue.len(), "playback session ready");
                self.snapshot
                    .send_replace(PlaybackSnapshot::Ready(ReadyState::new(track)));
                queue
            }
            Err(e) => {
                self.fail(e);
                drop(events);
                conn.disconnect();
                return;
            }
        };

        let mut poll = time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;

        let ack = loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(SessionCmd::Shutdown(ack)) => break Some(ack),
                    Some(SessionCmd::Transport(cmd)) => self.forward(&mut conn, cmd, &queue),
                    None => break None,
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        if let Some(input) = translate(event, &conn) {
                            if self.settles_seek_gate(&input) {
                                self.apply(input, &queue);
                            }
                        }
                    }
                    None => {
                        warn!("engine event stream closed");
                        events_open = false;
                    }
                },
                _ = poll.tick() => {
                    let position_ms = conn.current_position_ms();
                    self.apply(SyncInput::PollTick { position_ms }, &queue);
                }
                _ = time::sleep_until(self.seek_deadline.unwrap_or_else(Instant::now)),
                    if self.seek_deadline.is_some() =>
                {
                    debug!("seek not confirmed in time, clearing seeking flag");
                    self.apply(SyncInput::SeekTimedOut, &queue);
                }
            }
        };

        // Stop polling and unsubscribe before the connection is released.
        drop(poll);
        drop(events);
        conn.disconnect();
        info!(track = %self.track_id, "playback session closed");
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    fn resolve_queue(&self) -> Result<(Queue, usize), SessionError> {
        let listing = self.catalog.list_tracks()?;
        Queue::build(listing, self.track_id).ok_or(SessionError::TrackNotFound(self.track_id))
    }

    fn fail(&self, error: SessionError) {
        warn!(track = %self.track_id, error = %error, "playback session failed");
        self.snapshot
            .send_replace(PlaybackSnapshot::failed(error.reason()));
    }

    /// Drain commands until a teardown request; nothing can be forwarded yet.
    async fn wait_for_shutdown(&mut self) -> Option<oneshot::Sender<()>> {
        loop {
            match self.commands.recv().await {
                Some(SessionCmd::Shutdown(ack)) => return Some(ack),
                Some(SessionCmd::Transport(cmd)) => debug!(?cmd, "not connected, command dropped"),
                None => return None,
            }
        }
    }

    fn forward<C: EngineConnection>(&mut self, conn: &mut C, cmd: Transport, queue: &Queue) {
        debug!(?cmd, "forwarding to engine");
        match cmd {
            Transport::Play => conn.play(),
            Transport::Pause => conn.pause(),
            Transport::SkipNext => conn.skip_next(),
            Transport::SkipPrevious => conn.skip_previous(),
            Transport::Seek(target_ms) => {
                self.apply(SyncInput::SeekRequested { target_ms }, queue);
                let target_ms = self
                    .snapshot
                    .borrow()
                    .ready()
                    .map_or(target_ms, |s| s.position_ms);
                conn.seek(target_ms);
                self.pending_seeks += 1;
                self.seek_deadline = self.seek_timeout.map(|t| Instant::now() + t);
            }
        }
    }

    /// Swallow the confirmation of a seek that a later seek superseded.
    fn settles_seek_gate(&mut self, input: &SyncInput) -> bool {
        let SyncInput::Discontinuity {
            reason: DiscontinuityReason::Seek,
            position_ms,
        } = input
        else {
            return true;
        };
        if self.pending_seeks > 1 {
            self.pending_seeks -= 1;
            debug!(
                position_ms,
                pending = self.pending_seeks,
                "superseded seek confirmed, still waiting"
            );
            return false;
        }
        self.pending_seeks = 0;
        true
    }

    fn apply(&mut self, input: SyncInput, queue: &Queue) {
        self.snapshot.send_if_modified(|current| {
            let next = fold(current.clone(), input, queue);
            if next == *current {
                return false;
            }
            *current = next;
            true
        });

        let seeking = self.snapshot.borrow().ready().is_some_and(|s| s.is_seeking);
        if !seeking {
            self.seek_deadline = None;
            self.pending_seeks = 0;
        }
    }
}

/// Map an engine event onto a fold input. `None` means the event carries
/// nothing the snapshot tracks.
fn translate<C: EngineConnection>(event: EngineEvent, conn: &C) -> Option<SyncInput> {
    match event {
        EngineEvent::IsPlayingChanged(playing) => Some(SyncInput::IsPlayingChanged(playing)),
        EngineEvent::PlaybackStateChanged(PlayerState::Ready) => Some(SyncInput::Prepared {
            duration_ms: conn.duration_ms(),
        }),
        EngineEvent::PlaybackStateChanged(state) => {
            debug!(?state, "engine state changed");
            None
        }
        EngineEvent::TrackTransitioned { index } => Some(SyncInput::TrackTransitioned { index }),
        EngineEvent::PositionDiscontinuity {
            reason,
            position_ms,
        } => Some(SyncInput::Discontinuity {
            reason,
            position_ms,
        }),
    }
}
