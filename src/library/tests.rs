use super::*;
use crate::config::TrackDisplayField;

fn new_track(title: &str, source: &str) -> NewTrack {
    NewTrack {
        title: title.to_string(),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        duration_ms: 120_000,
        source: source.to_string(),
    }
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let store = LibraryStore::in_memory();
    let track = store.insert(new_track("Song", "/tmp/Song.mp3")).unwrap();

    assert_eq!(
        display_from_fields(
            &track,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(&track, &[TrackDisplayField::Filename], " - "),
        "Song"
    );
    assert_eq!(display_from_fields(&track, &[], " - "), "Song");
}

#[test]
fn insert_assigns_increasing_ids_and_get_track_finds_them() {
    let store = LibraryStore::in_memory();
    let a = store.insert(new_track("A", "/a.mp3")).unwrap();
    let b = store.insert(new_track("B", "/b.mp3")).unwrap();

    assert_eq!(a.id, TrackId(0));
    assert_eq!(b.id, TrackId(1));
    assert_eq!(store.get_track(b.id), Some(b));
    assert_eq!(store.get_track(TrackId(42)), None);
}

#[test]
fn import_skips_sources_already_in_the_catalog() {
    let store = LibraryStore::in_memory();
    store.insert(new_track("A", "/a.mp3")).unwrap();

    let added = store
        .import(vec![new_track("A again", "/a.mp3"), new_track("B", "/b.mp3")])
        .unwrap();

    assert_eq!(added.len(), 1);
    assert_eq!(added[0].title, "B");
    assert_eq!(store.list_tracks().unwrap().len(), 2);
}

#[test]
fn watchers_see_inserts_and_deletes() {
    let store = LibraryStore::in_memory();
    let mut rx = store.watch_tracks();
    assert!(rx.borrow_and_update().is_empty());

    let a = store.insert(new_track("A", "/a.mp3")).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    assert!(store.delete(a.id).unwrap());
    assert!(rx.borrow_and_update().is_empty());
    assert!(!store.delete(a.id).unwrap());
}

#[test]
fn unchanged_listing_is_not_republished() {
    let store = LibraryStore::in_memory();
    store.insert(new_track("A", "/a.mp3")).unwrap();
    let mut rx = store.watch_tracks();
    rx.borrow_and_update();

    assert!(!store.delete(TrackId(99)).unwrap());
    assert!(!rx.has_changed().unwrap());

    let added = store.import(vec![new_track("A again", "/a.mp3")]).unwrap();
    assert!(added.is_empty());
    assert!(!rx.has_changed().unwrap());

    store.import(vec![new_track("B", "/b.mp3")]).unwrap();
    assert!(rx.has_changed().unwrap());
}

#[test]
fn save_and_reopen_round_trips_tracks_and_next_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("library.toml");

    let store = LibraryStore::open(&path).unwrap();
    store.insert(new_track("A", "/a.mp3")).unwrap();
    let b = store.insert(new_track("B", "/b.mp3")).unwrap();
    store.delete(b.id).unwrap();
    store.save().unwrap();

    let reopened = LibraryStore::open(&path).unwrap();
    let tracks = reopened.list_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "A");

    // Deleted ids are never handed out again.
    let c = reopened.insert(new_track("C", "/c.mp3")).unwrap();
    assert_eq!(c.id, TrackId(2));
}

#[test]
fn open_rejects_malformed_library_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.toml");
    std::fs::write(&path, "tracks = 3").unwrap();

    assert!(matches!(
        LibraryStore::open(&path),
        Err(CatalogError::Parse { .. })
    ));
}
