//! Application model types: `App` and `Screen`.

use crate::library::{Track, TrackId};
use crate::sync::{PlaybackCommands, PlaybackSnapshot, SessionHandle};

/// Which screen the TUI shows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Library,
    Player,
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub screen: Screen,
    /// One-line message shown in the status box (import/delete results, errors).
    pub status: Option<String>,
    session: Option<SessionHandle>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            selected: 0,
            screen: Screen::Library,
            status: None,
            session: None,
        }
    }

    /// Replace the listing, keeping the cursor on the same track when it survived.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        let selected_id = self.selected_track().map(|t| t.id);
        self.tracks = tracks;
        self.selected = selected_id
            .and_then(|id| self.tracks.iter().position(|t| t.id == id))
            .unwrap_or(self.selected)
            .min(self.tracks.len().saturating_sub(1));
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.tracks.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// Attach a new session and switch to the player screen.
    ///
    /// Returns the session it replaces; the caller shuts it down.
    pub fn open_session(&mut self, session: SessionHandle) -> Option<SessionHandle> {
        self.screen = Screen::Player;
        self.session.replace(session)
    }

    /// Detach the session and return to the library screen.
    pub fn close_session(&mut self) -> Option<SessionHandle> {
        self.screen = Screen::Library;
        self.session.take()
    }

    pub fn session_track(&self) -> Option<TrackId> {
        self.session.as_ref().map(SessionHandle::track_id)
    }

    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.session.as_ref().map(SessionHandle::snapshot)
    }

    /// Controls of the active session, or detached controls without one.
    pub fn commands(&self) -> PlaybackCommands {
        self.session
            .as_ref()
            .map(SessionHandle::commands)
            .unwrap_or_default()
    }

    pub fn toggle_play_pause(&self) {
        let playing = self
            .snapshot()
            .as_ref()
            .and_then(PlaybackSnapshot::ready)
            .is_some_and(|s| s.is_playing);
        if playing {
            self.commands().pause();
        } else {
            self.commands().play();
        }
    }

    /// Seek relative to the displayed position. No-op unless the session is ready.
    pub fn seek_by(&self, delta_ms: i64) {
        let Some(position_ms) = self
            .snapshot()
            .as_ref()
            .and_then(PlaybackSnapshot::ready)
            .map(|s| s.position_ms)
        else {
            return;
        };
        self.commands()
            .seek(position_ms.saturating_add_signed(delta_ms));
    }
}
