//! MPRIS media-session surface (`org.mpris.MediaPlayer2`).
//!
//! The D-Bus service runs on its own thread. Method calls are forwarded to the
//! event loop as `ControlCmd`s; the event loop mirrors the active session's
//! snapshot back through `MprisHandle`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::sync::PlaybackSnapshot;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.segue";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    /// Leave the player screen and end the session.
    Stop,
    Next,
    Prev,
    /// Relative seek in milliseconds.
    Seek(i64),
    /// Absolute position in milliseconds.
    SetPosition(u64),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    /// `Stopped` unless a session is ready.
    pub fn from_snapshot(snapshot: Option<&PlaybackSnapshot>) -> Self {
        match snapshot.and_then(PlaybackSnapshot::ready) {
            Some(state) if state.is_playing => Self::Playing,
            Some(_) => Self::Paused,
            None => Self::Stopped,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct SharedState {
    playback: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    position_micros: i64,
}

impl SharedState {
    fn set_track(&mut self, track: Option<&Track>, duration_ms: u64) {
        let Some(track) = track else {
            self.title = None;
            self.artist.clear();
            self.album = None;
            self.url = None;
            self.length_micros = None;
            self.track_id = None;
            return;
        };
        self.title = Some(track.title.clone());
        self.artist = vec![track.artist.clone()];
        self.album = Some(track.album.clone());
        self.url = file_url(&track.source);
        let duration_ms = if duration_ms > 0 {
            duration_ms
        } else {
            track.duration_ms
        };
        self.length_micros = (duration_ms > 0).then(|| millis_to_micros(duration_ms));
        self.track_id = ObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", track.id))
            .ok()
            .map(OwnedObjectPath::from);
    }
}

/// `file://` URI for an absolute path, each segment percent-encoded.
fn file_url(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    Some(format!("file://{}", encoded.join("/")))
}

fn millis_to_micros(ms: u64) -> i64 {
    i64::try_from(ms.saturating_mul(1_000)).unwrap_or(i64::MAX)
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Mirror the active session (or its absence).
    ///
    /// Position-only changes do not notify; MPRIS clients poll `Position`.
    pub fn set_snapshot(&self, snapshot: Option<&PlaybackSnapshot>) {
        let ready = snapshot.and_then(PlaybackSnapshot::ready);
        let Ok(mut s) = self.state.lock() else {
            return;
        };

        let mut next = s.clone();
        next.playback = PlaybackStatus::from_snapshot(snapshot);
        next.set_track(
            ready.map(|r| &r.current_track),
            ready.map_or(0, |r| r.duration_ms),
        );
        next.position_micros = ready.map_or(0, |r| millis_to_micros(r.position_ms));

        let changed = next.playback != s.playback
            || next.track_id != s.track_id
            || next.length_micros != s.length_micros;
        *s = next;
        drop(s);

        if changed {
            let _ = self.notify.send(());
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "segue"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("event loop gone, MPRIS call dropped");
        }
    }

    fn snapshot(&self) -> SharedState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        self.send(ControlCmd::Seek(offset / 1_000));
    }

    /// Ignored unless `track_id` is the current track, as MPRIS requires.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.snapshot().track_id;
        let is_current = current.as_ref().map(|p| p.as_str()) == Some(track_id.as_str());
        if position < 0 || !is_current {
            debug!(%track_id, position, "stale SetPosition ignored");
            return;
        }
        self.send(ControlCmd::SetPosition(position as u64 / 1_000));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.snapshot().playback.as_str()
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.snapshot().position_micros
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let s = self.snapshot();
        let mut map = HashMap::new();
        let mut put = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(track_id) = s.track_id {
            put("mpris:trackid", Value::from(track_id.into_inner()));
        }
        if let Some(title) = s.title {
            put("xesam:title", Value::from(title));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist));
        }
        if let Some(album) = s.album {
            put("xesam:album", Value::from(album));
        }
        if let Some(url) = s.url {
            put("xesam:url", Value::from(url));
        }
        if let Some(length) = s.length_micros {
            put("mpris:length", Value::from(length));
        }
        map
    }
}

/// Start the MPRIS service. Failing to reach the session bus is logged and
/// leaves the handle working against a service that never comes up.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("segue-mpris".to_string())
        .spawn(move || {
            block_on(async move {
                if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                    warn!(error = %e, "MPRIS service unavailable");
                }
            })
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to spawn MPRIS thread");
    }

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    debug!(name = BUS_NAME, "MPRIS service registered");

    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        Timer::after(Duration::from_millis(250)).await;

        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if dirty {
            emit_changes(&*player.get().await, player.signal_emitter()).await?;
        }
    }
}

async fn emit_changes(iface: &PlayerIface, emitter: &SignalEmitter<'_>) -> zbus::Result<()> {
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await
}
