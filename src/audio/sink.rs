//! Opening tracks as `rodio` sources and sinks.
//!
//! Seeking is done by rebuilding the sink with `skip_duration`, so every
//! load goes through `create_sink_at`. The audio thread only sees the
//! `Output` and `Voice` traits, implemented here for `OutputStream` and `Sink`.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::source::SkipDuration;
use rodio::{Decoder, OutputStream, Sink, Source};
use thiserror::Error;

use crate::library::Track;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: DecoderError,
    },
}

/// Where the audio thread loads tracks into.
pub(super) trait Output {
    type Voice: Voice;

    /// Load `track` paused at `start_at`, with the decoder's total duration if known.
    fn load(
        &self,
        track: &Track,
        start_at: Duration,
    ) -> Result<(Self::Voice, Option<Duration>), AudioError>;
}

/// One loaded track.
pub(super) trait Voice {
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    /// Time played since the voice was loaded.
    fn elapsed(&self) -> Duration;
    /// Whether everything appended has been played.
    fn finished(&self) -> bool;
}

impl Output for OutputStream {
    type Voice = Sink;

    fn load(&self, track: &Track, start_at: Duration) -> Result<(Sink, Option<Duration>), AudioError> {
        create_sink_at(self, track, start_at)
    }
}

impl Voice for Sink {
    fn play(&self) {
        Sink::play(self);
    }

    fn pause(&self) {
        Sink::pause(self);
    }

    fn stop(&self) {
        Sink::stop(self);
    }

    fn elapsed(&self) -> Duration {
        self.get_pos()
    }

    fn finished(&self) -> bool {
        self.empty()
    }
}

pub(super) type TrackSource = SkipDuration<Decoder<BufReader<File>>>;

/// Decode `track` and position it at `start_at`.
///
/// Also returns the decoder's total duration when the format reports one.
pub(super) fn open_source(
    track: &Track,
    start_at: Duration,
) -> Result<(TrackSource, Option<Duration>), AudioError> {
    let file = File::open(&track.source).map_err(|source| AudioError::Open {
        path: track.source.clone(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode {
        path: track.source.clone(),
        source,
    })?;
    let total = decoder.total_duration();
    Ok((decoder.skip_duration(start_at), total))
}

/// Create a paused `Sink` for `track` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    track: &Track,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), AudioError> {
    let (source, total) = open_source(track, start_at)?;
    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
