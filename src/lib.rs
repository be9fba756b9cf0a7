//! segue: a terminal library browser and player built around a playback
//! state synchronizer.
//!
//! `sync` keeps one UI-facing `PlaybackSnapshot` consistent with an
//! asynchronous playback engine (`engine`, implemented over rodio by
//! `audio`). `library` is the persisted track catalog and its importer; `ui`,
//! `app` and `runtime` make up the TUI, and `mpris` the desktop media-session
//! surface.

pub mod app;
pub mod audio;
pub mod config;
pub mod engine;
pub mod library;
pub mod mpris;
pub mod runtime;
pub mod sync;
pub mod ui;
