use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Composes metadata fields (artist, title, album, filename, source) in the
/// configured order and falls back to `title` when no parts were produced.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Title => push_trimmed(&mut parts, &track.title),
            TrackDisplayField::Artist => push_trimmed(&mut parts, &track.artist),
            TrackDisplayField::Album => push_trimmed(&mut parts, &track.album),
            TrackDisplayField::Filename => {
                if let Some(stem) = Path::new(&track.source)
                    .file_stem()
                    .and_then(|s| s.to_str())
                {
                    push_trimmed(&mut parts, stem);
                }
            }
            TrackDisplayField::Source => parts.push(track.source.clone()),
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}

fn push_trimmed(parts: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        parts.push(value.to_string());
    }
}
