//! File browser overlay.
//!
//! Used both for the in-app file picker and for the SoundFont selector shown
//! before the audio engine exists.

use crate::app::{BrowserFilter, FileBrowserState};
use crate::loader::FileKind;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;
use std::path::Path;

use super::{centered_rect, Palette};

/// Truncates a path string to fit within max_width, adding "..." prefix if needed.
#[inline]
fn truncate_path(path_str: &str, max_width: usize) -> String {
    let chars: Vec<char> = path_str.chars().collect();
    if chars.len() > max_width && max_width > 3 {
        let tail: String = chars[chars.len() - (max_width - 3)..].iter().collect();
        format!("...{}", tail)
    } else {
        path_str.to_string()
    }
}

/// Extracts the display name from a path, returning "?" if extraction fails.
#[inline]
fn path_display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("?")
        .to_string()
}

/// Renders a file browser dialog overlay.
///
/// Records the number of visible list rows in the browser so keyboard
/// scrolling follows the drawn height.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `browser` - Browser state
/// * `title` - Dialog title
/// * `palette` - Theme colours
pub fn render_file_browser(
    frame: &mut Frame,
    browser: &mut FileBrowserState,
    title: &str,
    palette: &Palette,
) {
    let area = centered_rect(65, 75, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .style(palette.base())
        .border_style(Style::default().fg(palette.accent));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Current path
            Constraint::Length(1), // Separator
            Constraint::Min(3),    // File list
            Constraint::Length(1), // Instructions
        ])
        .split(inner);

    let path_str = browser.current_dir.display().to_string();
    let max_width = chunks[0].width.saturating_sub(2) as usize;
    frame.render_widget(
        Paragraph::new(Span::styled(
            truncate_path(&path_str, max_width),
            Style::default().fg(palette.accent),
        )),
        chunks[0],
    );

    let visible_height = chunks[2].height as usize;
    browser.visible_rows = visible_height;
    let start_idx = browser.scroll.min(browser.entries.len());
    let end_idx = (start_idx + visible_height).min(browser.entries.len());

    let items: Vec<ListItem> = if browser.entries.is_empty() {
        let empty = match browser.filter {
            BrowserFilter::Loadable => "No MIDI files or SoundFonts in this directory",
            BrowserFilter::SoundFonts => "No SoundFont files found in this directory",
        };
        vec![ListItem::new(Line::from(Span::styled(
            empty,
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        )))]
    } else {
        browser.entries[start_idx..end_idx]
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let is_selected = start_idx + i == browser.selected;

                let (icon, name, color) = if path == Path::new("..") {
                    ("[..]", "Parent Directory".to_string(), palette.accent)
                } else if path.is_dir() {
                    ("[D]", path_display_name(path), palette.accent)
                } else {
                    match FileKind::detect(path) {
                        Some(FileKind::Midi) => ("[M]", path_display_name(path), palette.highlight),
                        _ => ("[SF]", path_display_name(path), palette.text),
                    }
                };

                let style = Style::default().fg(color);
                let display_style = if is_selected {
                    style.add_modifier(Modifier::REVERSED)
                } else {
                    style
                };

                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", icon), Style::default().fg(palette.dim)),
                    Span::styled(name, display_style),
                ]))
            })
            .collect()
    };

    frame.render_widget(List::new(items), chunks[2]);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("[Up/Down]", Style::default().fg(palette.accent)),
            Span::styled(" Navigate  ", Style::default().fg(palette.dim)),
            Span::styled("[Enter]", Style::default().fg(palette.accent)),
            Span::styled(" Open  ", Style::default().fg(palette.dim)),
            Span::styled("[Esc]", Style::default().fg(palette.accent)),
            Span::styled(" Cancel", Style::default().fg(palette.dim)),
        ])),
        chunks[3],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_path() {
        assert_eq!(truncate_path("/short", 20), "/short");
        assert_eq!(truncate_path("/a/very/long/path", 10), "...ng/path");
        assert_eq!(truncate_path("/a/very/long/path", 10).len(), 10);
    }

    #[test]
    fn test_path_display_name() {
        assert_eq!(path_display_name(Path::new("/tmp/song.mid")), "song.mid");
        assert_eq!(path_display_name(Path::new("/")), "?");
    }
}
