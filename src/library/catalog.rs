//! The track catalog: a persisted, push-updated listing of imported tracks.
//!
//! `Catalog` is the read boundary used by playback sessions and screens.
//! `LibraryStore` is the TOML-file backed implementation; every mutation is
//! published to live subscribers through a `watch` channel.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use super::model::{NewTrack, Track, TrackId};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to access library file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse library file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize library: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Library state is unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the track catalog.
pub trait Catalog: Send + Sync + 'static {
    /// Current listing, read once.
    fn list_tracks(&self) -> Result<Vec<Track>, CatalogError>;
    /// Live listing that is pushed a new value on every catalog change.
    fn watch_tracks(&self) -> watch::Receiver<Vec<Track>>;
    /// Point lookup by id.
    fn get_track(&self, id: TrackId) -> Option<Track>;
}

/// On-disk representation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct StoreFile {
    next_id: u64,
    tracks: Vec<Track>,
}

pub struct LibraryStore {
    path: Option<PathBuf>,
    state: Mutex<StoreFile>,
    listing: watch::Sender<Vec<Track>>,
}

impl LibraryStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::from_file(None, StoreFile::default())
    }

    /// Open the library file at `path`. A missing file yields an empty library.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let file = match fs::read_to_string(path) {
            Ok(text) => toml::from_str::<StoreFile>(&text).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        info!(path = %path.display(), tracks = file.tracks.len(), "library opened");
        Ok(Self::from_file(Some(path.to_path_buf()), file))
    }

    fn from_file(path: Option<PathBuf>, mut file: StoreFile) -> Self {
        // Ids must stay unique even if the file was edited by hand.
        let max_id = file.tracks.iter().map(|t| t.id.0 + 1).max().unwrap_or(0);
        file.next_id = file.next_id.max(max_id);

        let (listing, _) = watch::channel(file.tracks.clone());
        Self {
            path,
            state: Mutex::new(file),
            listing,
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StoreFile) -> T) -> Result<T, CatalogError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        let out = f(&mut state);
        self.listing.send_if_modified(|listing| {
            if *listing == state.tracks {
                return false;
            }
            listing.clone_from(&state.tracks);
            true
        });
        Ok(out)
    }

    /// Insert a single track, assigning the next id.
    pub fn insert(&self, track: NewTrack) -> Result<Track, CatalogError> {
        self.with_state(|state| {
            let track = track.with_id(TrackId(state.next_id));
            state.next_id += 1;
            state.tracks.push(track.clone());
            debug!(id = %track.id, title = %track.title, "track inserted");
            track
        })
    }

    /// Insert every track whose source is not already in the catalog.
    pub fn import(&self, tracks: Vec<NewTrack>) -> Result<Vec<Track>, CatalogError> {
        self.with_state(|state| {
            let mut known: HashSet<String> =
                state.tracks.iter().map(|t| t.source.clone()).collect();
            let mut added = Vec::new();
            for new in tracks {
                if !known.insert(new.source.clone()) {
                    continue;
                }
                let track = new.with_id(TrackId(state.next_id));
                state.next_id += 1;
                state.tracks.push(track.clone());
                added.push(track);
            }
            info!(added = added.len(), total = state.tracks.len(), "import finished");
            added
        })
    }

    /// Remove a track. Returns whether it was present.
    pub fn delete(&self, id: TrackId) -> Result<bool, CatalogError> {
        self.with_state(|state| {
            let before = state.tracks.len();
            state.tracks.retain(|t| t.id != id);
            let removed = state.tracks.len() != before;
            if removed {
                info!(%id, "track deleted");
            }
            removed
        })
    }

    /// Write the library file. In-memory stores do nothing.
    pub fn save(&self) -> Result<(), CatalogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = {
            let state = self
                .state
                .lock()
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
            toml::to_string_pretty(&*state)?
        };

        let io_err = |source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, text).map_err(io_err)?;
        debug!(path = %path.display(), "library saved");
        Ok(())
    }
}

impl Catalog for LibraryStore {
    fn list_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        let state = self
            .state
            .lock()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok(state.tracks.clone())
    }

    fn watch_tracks(&self) -> watch::Receiver<Vec<Track>> {
        self.listing.subscribe()
    }

    fn get_track(&self, id: TrackId) -> Option<Track> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.tracks.iter().find(|t| t.id == id).cloned())
    }
}

/// Default library file under `$XDG_DATA_HOME/segue/library.toml` or
/// `~/.local/share/segue/library.toml`.
pub fn default_store_path() -> Option<PathBuf> {
    let data_home = if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
    };

    data_home.map(|d| d.join("segue").join("library.toml"))
}
