//! Terminal user interface components.
//!
//! This module draws the transport bar, the sixteen channel rows (control
//! panel plus keyboard), the status line and the overlays, and records the
//! screen regions the mouse handlers hit-test against.

mod channels;
mod dialogs;
mod help;
mod transport;

use crate::app::{App, LayoutRegions};
use crate::prefs::Theme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

pub use channels::{render_channels, CHANNEL_ROW_HEIGHT};
pub use dialogs::render_file_browser;
pub use help::render_help;
pub use transport::render_transport;

/// Colours for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub dim: Color,
    pub border: Color,
    pub accent: Color,
    pub highlight: Color,
    pub invalid: Color,
    pub white_key: Color,
    pub black_key: Color,
    pub key_edge: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Color::Rgb(248, 249, 250),
                text: Color::Rgb(33, 37, 41),
                dim: Color::Rgb(108, 117, 125),
                border: Color::Rgb(173, 181, 189),
                accent: Color::Rgb(13, 110, 253),
                highlight: Color::Rgb(25, 135, 84),
                invalid: Color::Rgb(220, 53, 69),
                white_key: Color::Rgb(255, 255, 255),
                black_key: Color::Rgb(33, 37, 41),
                key_edge: Color::Rgb(173, 181, 189),
            },
            Theme::Dark => Self {
                background: Color::Rgb(33, 37, 41),
                text: Color::Rgb(222, 226, 230),
                dim: Color::Rgb(134, 142, 150),
                border: Color::Rgb(73, 80, 87),
                accent: Color::Rgb(110, 168, 254),
                highlight: Color::Rgb(117, 183, 152),
                invalid: Color::Rgb(234, 134, 143),
                white_key: Color::Rgb(206, 212, 218),
                black_key: Color::Rgb(12, 14, 16),
                key_edge: Color::Rgb(108, 117, 125),
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }
}

/// Splits the screen into transport, channel list and status line.
fn calculate_layout(size: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport
            Constraint::Min(CHANNEL_ROW_HEIGHT),
            Constraint::Length(1), // Status line
        ])
        .split(size);
    [chunks[0], chunks[1], chunks[2]]
}

/// Renders the complete UI and updates the app's layout regions.
pub fn render(frame: &mut Frame, app: &mut App) {
    let palette = Palette::for_theme(app.theme);
    let size = frame.area();
    frame.render_widget(Block::default().style(palette.base()), size);

    let [transport_area, channels_area, status_area] = calculate_layout(size);

    let seek_bar = render_transport(frame, transport_area, app, &palette);
    let keyboards = render_channels(frame, channels_area, app, &palette);
    render_status_line(frame, status_area, app, &palette);

    app.update_layout(LayoutRegions {
        transport: transport_area,
        seek_bar,
        keyboards,
    });

    if app.file_browser.open {
        render_file_browser(frame, &mut app.file_browser, " Open File ", &palette);
    }
    if app.show_help {
        render_help(frame, app.help_scroll, &palette);
    }
}

/// Status message, or the main key hints when there is none.
fn render_status_line(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let line = if let Some((msg, _)) = &app.status_message {
        Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        let key = Style::default().fg(palette.accent);
        let desc = Style::default().fg(palette.dim);
        let mut spans = Vec::new();
        for (k, d) in [
            ("Space", "Play "),
            ("s", "Stop "),
            ("o", "Open "),
            ("Tab", "Control "),
            ("#", "Program "),
            ("d", "Theme "),
            ("?", "Help "),
            ("q", "Quit"),
        ] {
            spans.push(Span::styled("[", desc));
            spans.push(Span::styled(k, key));
            spans.push(Span::styled("]", desc));
            spans.push(Span::styled(d, desc));
        }
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Formats seconds as `m:ss.s`.
pub fn format_time(secs: f64) -> String {
    let secs = secs.max(0.0);
    let minutes = (secs / 60.0).floor() as u64;
    format!("{}:{:04.1}", minutes, secs - minutes as f64 * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00.0");
        assert_eq!(format_time(5.5), "0:05.5");
        assert_eq!(format_time(61.0), "1:01.0");
        assert_eq!(format_time(-3.0), "0:00.0");
    }

    #[test]
    fn test_centered_rect_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let rect = centered_rect(60, 70, area);
        assert!(rect.x >= area.x && rect.right() <= area.right());
        assert!(rect.y >= area.y && rect.bottom() <= area.bottom());
    }
}
