//! Channel rows: control panel and piano keyboard per channel.
//!
//! Keys are drawn by sampling the keyboard layout at every cell centre, the
//! same mapping the mouse handler uses, so what is drawn is what is hit.

use super::Palette;
use crate::app::{cell_point, App};
use crate::midi::DRUM_CHANNEL;
use crate::piano::{ChannelState, ControlKind, RenderableKeyboard};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Rows per channel.
pub const CHANNEL_ROW_HEIGHT: u16 = 2;

/// Width of the control panel left of each keyboard.
const PANEL_WIDTH: u16 = 36;

/// Renders as many channel rows as fit, keeping the selected one visible.
///
/// # Returns
///
/// The keyboard area of every drawn channel
pub fn render_channels(
    frame: &mut Frame,
    area: Rect,
    app: &mut App,
    palette: &Palette,
) -> Vec<(u8, Rect)> {
    let visible = (area.height / CHANNEL_ROW_HEIGHT).max(1) as usize;
    let selected = app.selected_channel as usize;
    if selected < app.channel_scroll {
        app.channel_scroll = selected;
    } else if selected >= app.channel_scroll + visible {
        app.channel_scroll = selected + 1 - visible;
    }

    let mut keyboards = Vec::new();
    for (row, state) in app
        .channels
        .iter()
        .skip(app.channel_scroll)
        .take(visible)
        .enumerate()
    {
        let y = area.y + row as u16 * CHANNEL_ROW_HEIGHT;
        let height = CHANNEL_ROW_HEIGHT.min(area.bottom().saturating_sub(y));
        if height == 0 {
            break;
        }
        let panel = Rect::new(area.x, y, PANEL_WIDTH.min(area.width), height);
        let keyboard = Rect::new(
            area.x + panel.width,
            y,
            area.width.saturating_sub(panel.width),
            height,
        );

        let is_selected = state.number == app.selected_channel;
        let name = app
            .instrument_names
            .get(state.number as usize)
            .map(String::as_str)
            .unwrap_or("");
        let entry = if is_selected {
            app.program_entry.as_deref()
        } else {
            None
        };
        let focus = is_selected.then_some(app.focused_control);
        frame.render_widget(
            Paragraph::new(panel_lines(state, name, focus, entry, palette)),
            panel,
        );

        if keyboard.width > 0 {
            render_keyboard(frame, keyboard, state, palette);
            keyboards.push((state.number, keyboard));
        }
    }
    keyboards
}

/// Two lines: volume, expression and pan; then program and instrument name.
fn panel_lines(
    state: &ChannelState,
    instrument: &str,
    focus: Option<ControlKind>,
    entry: Option<&str>,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let label = Style::default().fg(palette.dim);
    let value_style = |kind: ControlKind| {
        let style = Style::default().fg(palette.text);
        if focus == Some(kind) {
            style.fg(palette.accent).add_modifier(Modifier::REVERSED)
        } else {
            style
        }
    };

    let marker = if focus.is_some() { ">" } else { " " };
    let drum = if state.number == DRUM_CHANNEL { "D" } else { " " };
    let header = Style::default()
        .fg(if focus.is_some() { palette.accent } else { palette.text })
        .add_modifier(Modifier::BOLD);

    let first = Line::from(vec![
        Span::styled(format!("{}{:>2}{} ", marker, state.number + 1, drum), header),
        Span::styled("Vol ", label),
        Span::styled(format!("{:>3}", state.volume), value_style(ControlKind::Volume)),
        Span::styled(" Exp ", label),
        Span::styled(
            format!("{:>3}", state.expression),
            value_style(ControlKind::Expression),
        ),
        Span::styled(" Pan ", label),
        Span::styled(format!("{:>3}", state.pan), value_style(ControlKind::Pan)),
    ]);

    let program = match entry {
        Some(text) => Span::styled(
            format!("#{:<3}_", text),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::UNDERLINED),
        ),
        None if state.program_invalid => Span::styled(
            format!("{:>3}!", state.program),
            Style::default()
                .fg(palette.invalid)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            format!("{:>3} ", state.program),
            value_style(ControlKind::Program),
        ),
    };
    let max_name = (PANEL_WIDTH as usize).saturating_sub(14);
    let name: String = instrument.chars().take(max_name).collect();
    let second = Line::from(vec![
        Span::raw("     "),
        Span::styled("Prg ", label),
        program,
        Span::styled(format!(" {}", name), Style::default().fg(palette.dim)),
    ]);

    vec![first, second]
}

/// Draws a keyboard, one span per cell.
fn render_keyboard(frame: &mut Frame, area: Rect, state: &ChannelState, palette: &Palette) {
    let keyboard = &state.keyboard;
    let layout = keyboard.layout();
    let lines: Vec<Line> = (0..area.height)
        .map(|row| {
            let y = area.y + row;
            let notes: Vec<Option<u8>> = (0..area.width)
                .map(|col| keyboard.hit_test(cell_point(area, area.x + col, y, layout)))
                .collect();
            let spans: Vec<Span> = notes
                .iter()
                .enumerate()
                .map(|(i, note)| {
                    let Some(note) = *note else {
                        return Span::raw(" ");
                    };
                    let black = layout.key(note).map(|k| k.black).unwrap_or(false);
                    let bg = match keyboard.key_visual(note).fill() {
                        Some(fill) => {
                            let (r, g, b) = fill.to_rgb();
                            Color::Rgb(r, g, b)
                        }
                        None if black => palette.black_key,
                        None => palette.white_key,
                    };
                    // Mark the right edge of a white key where another white key follows.
                    let next = notes.get(i + 1).copied().flatten();
                    let edge = !black
                        && next.is_some_and(|n| n != note)
                        && !next
                            .and_then(|n| layout.key(n))
                            .map(|k| k.black)
                            .unwrap_or(false);
                    let symbol = if edge { "▕" } else { " " };
                    Span::styled(symbol, Style::default().fg(palette.key_edge).bg(bg))
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piano::KeyboardSurface;
    use crate::prefs::Theme;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_panel_lines() {
        let palette = Palette::for_theme(Theme::Dark);
        let mut state = ChannelState::new(9, KeyboardSurface::default());
        state.volume = 90;
        state.program = 5;

        let lines = panel_lines(&state, "Standard", None, None, &palette);
        assert_eq!(text(&lines[0]), " 10D Vol  90 Exp 127 Pan  64");
        assert_eq!(text(&lines[1]), "     Prg   5  Standard");

        state.program_invalid = true;
        let lines = panel_lines(&state, "Standard", Some(ControlKind::Pan), None, &palette);
        assert!(text(&lines[0]).starts_with(">10D"));
        assert_eq!(text(&lines[1]), "     Prg   5! Standard");

        let lines = panel_lines(&state, "Standard", Some(ControlKind::Program), Some("12"), &palette);
        assert_eq!(text(&lines[1]), "     Prg #12 _ Standard");
    }
}
