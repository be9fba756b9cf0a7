//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`: the
//! library list and the player screen driven by the session snapshot.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, Screen};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::display_from_fields;
use crate::sync::{PlaybackSnapshot, ReadyState};

const LIBRARY_CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play selected song"),
    ("d", "delete from library"),
    ("q", "quit"),
];

const PLAYER_CONTROLS: &[(&str, &str)] = &[
    ("space/p", "play/pause"),
    ("h/l", "prev/next song"),
    // H/L is filled in from config.
    ("H/L", ""),
    ("esc", "back to library"),
    ("q", "quit"),
];

/// Render the controls help text for `screen`, incorporating scrub seconds.
fn controls_text(screen: Screen, scrub_seconds: u64) -> String {
    let controls = match screen {
        Screen::Library => LIBRARY_CONTROLS,
        Screen::Player => PLAYER_CONTROLS,
    };
    controls
        .iter()
        .map(|(k, v)| {
            if *k == "H/L" {
                format!("[H/L] scrub -/+{}s", scrub_seconds)
            } else {
                format!("[{}] {}", k, v)
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the time text (elapsed/total/remaining) per `UiSettings`.
///
/// Total and remaining are left out while the duration is unknown.
fn now_playing_time_text(state: &ReadyState, ui: &UiSettings) -> Option<String> {
    let elapsed = Duration::from_millis(state.position_ms);
    let total = state
        .duration_known()
        .then(|| Duration::from_millis(state.duration_ms));

    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total => total.map(format_mmss),
            TimeField::Remaining => {
                total.map(|t| format!("-{}", format_mmss(t.saturating_sub(elapsed))))
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Short state label for the player screen.
fn playback_label(snapshot: &PlaybackSnapshot) -> String {
    match snapshot {
        PlaybackSnapshot::Loading => "Loading...".to_string(),
        PlaybackSnapshot::Failed { reason } => format!("Error: {reason}"),
        PlaybackSnapshot::Ready(state) => {
            let mut label = if state.is_playing { "Playing" } else { "Paused" }.to_string();
            if state.is_seeking {
                label.push_str(" (seeking)");
            }
            label
        }
    }
}

fn progress_ratio(state: &ReadyState) -> f64 {
    if !state.duration_known() {
        return 0.0;
    }
    (state.position_ms as f64 / state.duration_ms as f64).clamp(0.0, 1.0)
}

fn padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" segue ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let mut status = vec![format!("{} tracks", app.tracks.len())];
    if let Some(msg) = &app.status {
        status.push(msg.clone());
    }
    let status_par = Paragraph::new(status.join(" • "))
        .block(padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    match app.screen {
        Screen::Library => draw_library(frame, app, ui_settings, chunks[2]),
        Screen::Player => draw_player(frame, app, ui_settings, chunks[2]),
    }

    let footer = Paragraph::new(controls_text(app.screen, controls_settings.scrub_seconds))
        .block(padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_library(frame: &mut Frame, app: &App, ui: &UiSettings, area: Rect) {
    // Center the selected item when possible; only build items for the visible window.
    let total = app.tracks.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let (start, end) = if total <= list_height || list_height == 0 {
        (0, total)
    } else {
        let half = list_height / 2;
        let start = app
            .selected
            .saturating_sub(half)
            .min(total - list_height);
        (start, start + list_height)
    };

    let items: Vec<ListItem> = app.tracks[start..end]
        .iter()
        .map(|t| ListItem::new(display_from_fields(t, &ui.list_fields, &ui.list_separator)))
        .collect();

    let title = if total == 0 {
        " library (empty: run `segue import <dir>`) "
    } else {
        " library "
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(app.selected - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_player(frame: &mut Frame, app: &App, ui: &UiSettings, area: Rect) {
    let snapshot = app.snapshot().unwrap_or(PlaybackSnapshot::Loading);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let lines = match &snapshot {
        PlaybackSnapshot::Ready(state) => {
            let t = &state.current_track;
            vec![
                t.title.clone(),
                t.artist.clone(),
                t.album.clone(),
                String::new(),
                playback_label(&snapshot),
            ]
        }
        PlaybackSnapshot::Loading | PlaybackSnapshot::Failed { .. } => {
            vec![playback_label(&snapshot)]
        }
    };
    let mut info = Paragraph::new(lines.join("\n"))
        .block(padded(" now playing "))
        .wrap(Wrap { trim: true });
    if matches!(snapshot, PlaybackSnapshot::Failed { .. }) {
        info = info.red();
    }
    frame.render_widget(info, rows[0]);

    let (ratio, label) = match snapshot.ready() {
        Some(state) => (
            progress_ratio(state),
            now_playing_time_text(state, ui).unwrap_or_default(),
        ),
        None => (0.0, String::new()),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Track, TrackId};

    fn state(position_ms: u64, duration_ms: u64) -> ReadyState {
        let mut s = ReadyState::new(Track {
            id: TrackId(1),
            title: "Song".into(),
            artist: "Band".into(),
            album: "Record".into(),
            duration_ms: 0,
            source: "/m/song.ogg".into(),
        });
        s.position_ms = position_ms;
        s.duration_ms = duration_ms;
        s
    }

    #[test]
    fn time_text_uses_configured_fields() {
        let ui = UiSettings::default();
        assert_eq!(
            now_playing_time_text(&state(65_000, 180_000), &ui).as_deref(),
            Some("01:05 / 03:00 / -01:55")
        );
    }

    #[test]
    fn time_text_hides_total_until_duration_known() {
        let ui = UiSettings::default();
        assert_eq!(
            now_playing_time_text(&state(5_000, 0), &ui).as_deref(),
            Some("00:05")
        );
    }

    #[test]
    fn labels_reflect_snapshot() {
        assert_eq!(playback_label(&PlaybackSnapshot::Loading), "Loading...");
        assert_eq!(
            playback_label(&PlaybackSnapshot::failed("track not found")),
            "Error: track not found"
        );

        let mut s = state(0, 0);
        s.is_playing = true;
        s.is_seeking = true;
        assert_eq!(
            playback_label(&PlaybackSnapshot::Ready(s)),
            "Playing (seeking)"
        );
    }

    #[test]
    fn progress_ratio_is_bounded() {
        assert_eq!(progress_ratio(&state(5_000, 0)), 0.0);
        assert_eq!(progress_ratio(&state(90_000, 180_000)), 0.5);
    }

    #[test]
    fn controls_text_includes_scrub_step() {
        let text = controls_text(Screen::Player, 7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        assert!(controls_text(Screen::Library, 7).contains("[d] delete"));
    }
}
