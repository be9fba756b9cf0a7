//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the library listing, the
//! selection and the active playback session.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
