//! Track catalog and the import step that feeds it.
//!
//! `scan` walks a directory and reads tags into `NewTrack` records;
//! `LibraryStore` assigns ids, persists them and publishes the live listing.

mod catalog;
mod display;
mod model;
mod scan;

pub use catalog::{Catalog, CatalogError, LibraryStore, default_store_path};
pub use display::display_from_fields;
pub use model::{NewTrack, Track, TrackId};
pub use scan::{read_track, scan};

#[cfg(test)]
mod tests;
