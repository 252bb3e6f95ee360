//! Transport bar rendering.
//!
//! Displays the playback state, the position and a clickable seek bar.

use super::{format_time, Palette};
use crate::app::App;
use crate::audio::PlaybackState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Renders the transport bar at the top of the screen.
///
/// # Returns
///
/// The screen area of the seek bar, for mouse hit testing
pub fn render_transport(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) -> Rect {
    let title = match app.midi_path.as_deref().and_then(|p| p.file_name()) {
        Some(name) => format!(" Transport - {} ", name.to_string_lossy()),
        None => " Transport ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(13), // Playback state
            Constraint::Length(20), // Position
            Constraint::Min(10),    // Seek bar
        ])
        .split(inner);

    let play_status = match app.audio.playback_state() {
        PlaybackState::Playing => Span::styled(
            " [>] PLAY ",
            Style::default()
                .fg(palette.highlight)
                .add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Paused => Span::styled(
            " [||] PAUSE ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Stopped => Span::styled(
            " [.] STOP ",
            Style::default()
                .fg(palette.invalid)
                .add_modifier(Modifier::BOLD),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(play_status)), chunks[0]);

    let total = app.timeline().total_time();
    let position = app.position_secs().min(total);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format_time(position),
                Style::default()
                    .fg(palette.text)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" / {}", format_time(total)), Style::default().fg(palette.dim)),
        ])),
        chunks[1],
    );

    let seek_bar = Rect {
        width: chunks[2].width.saturating_sub(1),
        ..chunks[2]
    };
    let fraction = if total > 0.0 { position / total } else { 0.0 };
    frame.render_widget(
        Paragraph::new(seek_bar_line(seek_bar.width, fraction, palette)),
        seek_bar,
    );
    seek_bar
}

/// Builds the seek bar: filled up to `fraction`, with a handle.
fn seek_bar_line(width: u16, fraction: f64, palette: &Palette) -> Line<'static> {
    let width = width as usize;
    if width == 0 {
        return Line::default();
    }
    let handle = ((width - 1) as f64 * fraction.clamp(0.0, 1.0)).round() as usize;
    let filled = "━".repeat(handle);
    let rest = "─".repeat(width - handle - 1);
    Line::from(vec![
        Span::styled(filled, Style::default().fg(palette.accent)),
        Span::styled(
            "●",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(rest, Style::default().fg(palette.dim)),
    ])
}
