use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::{App, Screen};
use crate::config;
use crate::engine::PlaybackEngine;
use crate::library::{LibraryStore, Track};
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::sync;
use crate::ui;

/// Long-lived collaborators of the event loop.
pub struct Services<'a, E> {
    pub settings: &'a config::Settings,
    pub runtime: &'a Runtime,
    pub engine: E,
    pub store: Arc<LibraryStore>,
    pub mpris: &'a MprisHandle,
    pub control_rx: &'a mpsc::Receiver<ControlCmd>,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input, UI drawing, the library listing
/// and MPRIS. Returns `Ok(())` when shutdown is requested; the active
/// session, if any, has been torn down by then.
pub fn run<E: PlaybackEngine + Clone>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    services: &Services<'_, E>,
    app: &mut App,
    listing: &mut watch::Receiver<Vec<Track>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = EventLoopState::default();

    let result: Result<(), Box<dyn std::error::Error>> = (|| {
        loop {
            if listing.has_changed().unwrap_or(false) {
                let tracks = listing.borrow_and_update().clone();
                app.set_tracks(tracks);
            }

            update_mpris(services.mpris, app);

            terminal.draw(|f| {
                ui::draw(
                    f,
                    app,
                    &services.settings.ui,
                    &services.settings.controls,
                )
            })?;

            while let Ok(cmd) = services.control_rx.try_recv() {
                if handle_control_cmd(cmd, services, app) {
                    return Ok(());
                }
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key_event(key, services, app, &mut state) {
                        return Ok(());
                    }
                }
            }
        }
    })();

    close_session(services, app);
    result
}

/// Start a session for the selected track, replacing any active one.
fn open_selected<E: PlaybackEngine + Clone>(services: &Services<'_, E>, app: &mut App) {
    let Some(track_id) = app.selected_track().map(|t| t.id) else {
        return;
    };
    close_session(services, app);

    let session = {
        let _guard = services.runtime.enter();
        sync::start(
            services.engine.clone(),
            services.store.clone(),
            track_id,
            &services.settings.sync,
        )
    };
    app.status = None;
    app.open_session(session);
}

fn close_session<E>(services: &Services<'_, E>, app: &mut App) {
    if let Some(session) = app.close_session() {
        services.runtime.block_on(session.shutdown());
        update_mpris(services.mpris, app);
    }
}

fn delete_selected<E>(services: &Services<'_, E>, app: &mut App) {
    let Some(track) = app.selected_track().cloned() else {
        return;
    };
    let outcome = services.store.delete(track.id).and_then(|removed| {
        services.store.save()?;
        Ok(removed)
    });
    match outcome {
        Ok(true) => {
            info!(id = %track.id, title = %track.title, "deleted from library");
            app.status = Some(format!("Deleted: {}", track.title));
        }
        Ok(false) => {}
        Err(e) => {
            warn!(error = %e, "delete failed");
            app.status = Some(format!("Delete failed: {e}"));
        }
    }
}

fn scrub_ms(settings: &config::Settings) -> i64 {
    i64::try_from(settings.controls.scrub_seconds.saturating_mul(1_000)).unwrap_or(i64::MAX)
}

/// Returns whether the app should quit.
fn handle_control_cmd<E: PlaybackEngine + Clone>(
    cmd: ControlCmd,
    services: &Services<'_, E>,
    app: &mut App,
) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        // Without a session, play starts one for the selected track.
        ControlCmd::Play | ControlCmd::PlayPause if app.snapshot().is_none() => {
            open_selected(services, app);
        }
        ControlCmd::Play => app.commands().play(),
        ControlCmd::Pause => app.commands().pause(),
        ControlCmd::PlayPause => app.toggle_play_pause(),
        ControlCmd::Stop => close_session(services, app),
        ControlCmd::Next => app.commands().skip_next(),
        ControlCmd::Prev => app.commands().skip_previous(),
        ControlCmd::Seek(delta_ms) => app.seek_by(delta_ms),
        ControlCmd::SetPosition(position_ms) => app.commands().seek(position_ms),
    }
    false
}

/// Returns whether the app should quit.
fn handle_key_event<E: PlaybackEngine + Clone>(
    key: KeyEvent,
    services: &Services<'_, E>,
    app: &mut App,
    state: &mut EventLoopState,
) -> bool {
    let pending_gg = std::mem::take(&mut state.pending_gg);

    if key.code == KeyCode::Char('q') {
        return true;
    }

    match app.screen {
        Screen::Library => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.next(),
            KeyCode::Char('k') | KeyCode::Up => app.prev(),
            KeyCode::Char('g') => {
                if pending_gg {
                    app.select_first();
                } else {
                    state.pending_gg = true;
                }
            }
            KeyCode::Char('G') => app.select_last(),
            KeyCode::Enter => open_selected(services, app),
            KeyCode::Char('d') => delete_selected(services, app),
            _ => {}
        },
        Screen::Player => match key.code {
            KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_play_pause(),
            KeyCode::Char('l') => app.commands().skip_next(),
            KeyCode::Char('h') => app.commands().skip_previous(),
            KeyCode::Char('L') => app.seek_by(scrub_ms(services.settings)),
            KeyCode::Char('H') => app.seek_by(-scrub_ms(services.settings)),
            KeyCode::Esc => close_session(services, app),
            _ => {}
        },
    }

    false
}
