use std::sync::Arc;

use super::*;
use crate::config::SyncSettings;
use crate::engine::fake::{Call, FakeEngine};
use crate::library::{LibraryStore, NewTrack, Track, TrackId};
use crate::sync;
use crate::sync::SessionHandle;

fn t(id: u64, title: &str) -> Track {
    Track {
        id: TrackId(id),
        title: title.into(),
        artist: "Artist".into(),
        album: "Album".into(),
        duration_ms: 0,
        source: format!("/music/{title}.flac"),
    }
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn start_session(engine: &FakeEngine, titles: &[&str]) -> SessionHandle {
    let store = LibraryStore::in_memory();
    let mut first = None;
    for title in titles {
        let track = store
            .insert(NewTrack {
                title: title.to_string(),
                artist: "Artist".into(),
                album: "Album".into(),
                duration_ms: 0,
                source: format!("/music/{title}.flac"),
            })
            .unwrap();
        first.get_or_insert(track.id);
    }
    engine.set_duration(60_000);
    sync::start(
        engine.clone(),
        Arc::new(store),
        first.unwrap(),
        &SyncSettings::default(),
    )
}

#[test]
fn selection_wraps_both_ways() {
    let mut app = App::new(vec![t(0, "Alpha"), t(1, "Beta"), t(2, "Gamma")]);
    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.select_last();
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 0);
}

#[test]
fn selection_on_empty_library_is_inert() {
    let mut app = App::new(Vec::new());
    app.next();
    app.prev();
    assert_eq!(app.selected, 0);
    assert!(app.selected_track().is_none());
}

#[test]
fn set_tracks_keeps_cursor_on_same_track() {
    let mut app = App::new(vec![t(0, "Alpha"), t(1, "Beta"), t(2, "Gamma")]);
    app.selected = 2;
    app.set_tracks(vec![t(1, "Beta"), t(2, "Gamma")]);
    assert_eq!(app.selected_track().map(|t| t.id), Some(TrackId(2)));
}

#[test]
fn set_tracks_clamps_when_selected_track_is_gone() {
    let mut app = App::new(vec![t(0, "Alpha"), t(1, "Beta"), t(2, "Gamma")]);
    app.selected = 2;
    app.set_tracks(vec![t(0, "Alpha")]);
    assert_eq!(app.selected, 0);

    app.set_tracks(Vec::new());
    assert_eq!(app.selected, 0);
}

#[test]
fn controls_without_session_do_nothing() {
    let app = App::new(vec![t(0, "Alpha")]);
    assert!(app.snapshot().is_none());
    app.toggle_play_pause();
    app.seek_by(5_000);
    assert_eq!(app.screen, Screen::Library);
}

#[tokio::test(start_paused = true)]
async fn session_lifecycle_switches_screens() {
    let engine = FakeEngine::new();
    let mut app = App::new(Vec::new());

    let replaced = app.open_session(start_session(&engine, &["A", "B"]));
    assert!(replaced.is_none());
    assert_eq!(app.screen, Screen::Player);
    assert_eq!(app.session_track(), Some(TrackId(0)));

    let session = app.close_session().unwrap();
    assert_eq!(app.screen, Screen::Library);
    assert!(app.snapshot().is_none());

    session.shutdown().await;
    assert_eq!(engine.count(&Call::Disconnect), 1);
}

#[tokio::test(start_paused = true)]
async fn play_pause_toggles_from_snapshot() {
    let engine = FakeEngine::new();
    let mut app = App::new(Vec::new());
    app.open_session(start_session(&engine, &["A"]));
    settle().await;

    // prepare_and_play left the fake engine playing.
    app.toggle_play_pause();
    settle().await;
    assert_eq!(engine.count(&Call::Pause), 1);

    app.toggle_play_pause();
    settle().await;
    assert_eq!(engine.count(&Call::Play), 1);
}

#[tokio::test(start_paused = true)]
async fn seek_by_is_relative_to_displayed_position() {
    let engine = FakeEngine::new();
    let mut app = App::new(Vec::new());
    app.open_session(start_session(&engine, &["A"]));
    settle().await;

    app.seek_by(5_000);
    settle().await;
    assert_eq!(engine.count(&Call::Seek(5_000)), 1);

    // Backwards past the start lands on zero.
    app.seek_by(-60_000);
    settle().await;
    assert_eq!(engine.count(&Call::Seek(0)), 1);
}
