//! Help overlay rendering.
//!
//! Displays keyboard shortcuts and mouse controls in a modal overlay.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::{centered_rect, Palette};

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const fn bind(key: &'static str, description: &'static str) -> KeyBinding {
    KeyBinding { key, description }
}

const GENERAL_BINDINGS: &[KeyBinding] = &[
    bind("?", "Toggle this help"),
    bind("q / Esc", "Quit"),
    bind("Ctrl+C", "Force quit"),
    bind("d", "Toggle dark mode"),
];

const TRANSPORT_BINDINGS: &[KeyBinding] = &[
    bind("Space", "Play / Pause / Resume"),
    bind("s", "Stop (rewind to start)"),
    bind("Left / Right", "Seek back / forward 5 seconds"),
    bind("Home", "Seek to start"),
];

const CHANNEL_BINDINGS: &[KeyBinding] = &[
    bind("Up / Down", "Select channel"),
    bind("Tab", "Cycle control (Vol/Exp/Pan/Prg)"),
    bind("+ / -", "Adjust focused control"),
    bind("PgUp / PgDn", "Adjust focused control by 10"),
    bind("< / >", "Previous / next instrument"),
    bind("#", "Type a program number (Enter to apply)"),
];

const FILE_BINDINGS: &[KeyBinding] = &[
    bind("o", "Open MIDI file or SoundFont"),
    bind("Paste / Drop", "Load .mid/.midi/.sf2/.sf3 paths"),
];

const MOUSE_BINDINGS: &[KeyBinding] = &[
    bind("Click key", "Play a note on that channel"),
    bind("Drag", "Glide across keys and channels"),
    bind("Click seek bar", "Seek to that position"),
];

const SECTIONS: &[(&str, &[KeyBinding])] = &[
    ("General", GENERAL_BINDINGS),
    ("Transport", TRANSPORT_BINDINGS),
    ("Channels", CHANNEL_BINDINGS),
    ("Files", FILE_BINDINGS),
    ("Mouse Controls", MOUSE_BINDINGS),
];

/// Renders the help overlay.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `scroll` - Vertical scroll offset
/// * `palette` - Theme colours
pub fn render_help(frame: &mut Frame, scroll: u16, palette: &Palette) {
    let area = centered_rect(70, 80, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help - Keyboard Shortcuts ")
        .borders(Borders::ALL)
        .style(palette.base())
        .border_style(Style::default().fg(palette.accent));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Scrollable content
            Constraint::Length(1), // Fixed footer
        ])
        .split(inner);

    let section_style = Style::default()
        .fg(palette.highlight)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(palette.text);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(Span::styled(*title, section_style)));
        for binding in bindings.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:16}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), chunks[0]);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Scroll: Up/Down/j/k/Mouse  |  Close: ?/Esc/Click",
        Style::default()
            .fg(palette.dim)
            .add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(footer, chunks[1]);
}
