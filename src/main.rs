//! midiviz - A terminal MIDI player with sixteen playable keyboards.
//!
//! Loads Standard MIDI files and SoundFonts, plays them through rustysynth,
//! and mirrors playback onto one piano keyboard per channel. Every keyboard
//! can also be played live with the mouse.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- song.mid                     # Open a MIDI file
//! cargo run -- --soundfont GeneralUser.sf2  # Use a specific SoundFont
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

use midiviz::app::{App, BrowserFilter, FileBrowserState, MouseAction, SEEK_STEP_SECS};
use midiviz::audio::soundfont::find_bank_file;
use midiviz::prefs::{self, JsonFileStore, Theme};
use midiviz::ui::{self, Palette};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
    EnableFocusChange, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SOUNDFONT_DIR: &str = "soundfonts";
const DEFAULT_PREFS_PATH: &str = ".midiviz.json";

/// Command-line options for the application.
struct CliOptions {
    /// Path to a custom SoundFont file.
    soundfont: Option<PathBuf>,
    /// Directory holding per-program bank files.
    soundfont_dir: PathBuf,
    /// Preferences file.
    prefs: PathBuf,
    /// Files to load after startup.
    files: Vec<PathBuf>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--soundfont <path>` or `-sf <path>`: Specify a custom SoundFont file
    /// - `--soundfont-dir <dir>` or `-d <dir>`: Directory of per-program banks
    /// - `--prefs <path>`: Preferences file
    /// - `--help` or `-h`: Print help and exit
    /// - Positional `.mid`/`.midi`/`.sf2`/`.sf3` files are loaded on start
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut soundfont: Option<PathBuf> = None;
        let mut soundfont_dir = PathBuf::from(DEFAULT_SOUNDFONT_DIR);
        let mut prefs = PathBuf::from(DEFAULT_PREFS_PATH);
        let mut files = Vec::new();
        let mut i = 1;

        let value = |i: usize, flag: &str| -> PathBuf {
            match args.get(i) {
                Some(v) => PathBuf::from(v),
                None => {
                    eprintln!("Error: {} requires a path argument", flag);
                    std::process::exit(1);
                }
            }
        };

        while i < args.len() {
            match args[i].as_str() {
                "--soundfont" | "-sf" => {
                    i += 1;
                    soundfont = Some(value(i, "--soundfont"));
                }
                "--soundfont-dir" | "-d" => {
                    i += 1;
                    soundfont_dir = value(i, "--soundfont-dir");
                }
                "--prefs" => {
                    i += 1;
                    prefs = value(i, "--prefs");
                }
                "--help" | "-h" => {
                    print_help(args.first().map(String::as_str).unwrap_or("midiviz"));
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
                other => files.push(PathBuf::from(other)),
            }
            i += 1;
        }

        Ok(Self {
            soundfont,
            soundfont_dir,
            prefs,
            files,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("midiviz - Terminal MIDI player and keyboard visualizer");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] [FILES...]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -sf, --soundfont PATH     Load a specific SoundFont file (.sf2/.sf3)");
    eprintln!(
        "  -d, --soundfont-dir DIR   Directory of per-program banks (default: {})",
        DEFAULT_SOUNDFONT_DIR
    );
    eprintln!(
        "  --prefs PATH              Preferences file (default: {})",
        DEFAULT_PREFS_PATH
    );
    eprintln!("  -h, --help                Print this help message");
    eprintln!();
    eprintln!("FILES may be MIDI files (.mid/.midi) or SoundFonts (.sf2/.sf3).");
    eprintln!("Without a SoundFont, <DIR>/000.sf2 is tried, then you are prompted.");
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // 1. CLI SoundFont, 2. the bank file for program 0, 3. interactive selector
    let soundfont_path = match cli.soundfont.as_ref() {
        Some(path) if path.exists() => Some(path.clone()),
        Some(path) => {
            eprintln!("Warning: Specified soundfont not found: {}", path.display());
            eprintln!("Will prompt for soundfont selection.");
            None
        }
        None => find_bank_file(&cli.soundfont_dir, 0, 0),
    };

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    let soundfont_path = match soundfont_path {
        Some(path) => path,
        None => {
            let theme = startup_theme(&cli.prefs);
            match run_soundfont_selector(&mut terminal, theme)? {
                Some(path) => path,
                None => {
                    restore_terminal(&mut terminal)?;
                    return Ok(());
                }
            }
        }
    };

    let mut app = match App::new(&soundfont_path, cli.soundfont_dir.clone(), &cli.prefs) {
        Ok(app) => app,
        Err(e) => {
            restore_terminal(&mut terminal)?;
            return Err(e);
        }
    };

    for file in &cli.files {
        app.load_path(file);
    }

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Reads the theme for screens drawn before the app exists.
fn startup_theme(prefs_path: &Path) -> Theme {
    JsonFileStore::open(prefs_path)
        .map(|store| prefs::load_theme(&store))
        .unwrap_or_default()
}

/// Runs a standalone SoundFont selector before the App is created.
/// Returns the selected SoundFont path, or None if the user wants to quit.
fn run_soundfont_selector(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
) -> Result<Option<PathBuf>> {
    let palette = Palette::for_theme(theme);
    let mut browser = FileBrowserState::new(BrowserFilter::SoundFonts);
    browser.open_at(std::env::current_dir().unwrap_or_default());

    loop {
        terminal.draw(|frame| {
            ui::render_file_browser(
                frame,
                &mut browser,
                " Select a SoundFont to Continue ",
                &palette,
            );
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Up | KeyCode::Char('k') => browser.move_up(),
                        KeyCode::Down | KeyCode::Char('j') => browser.move_down(),
                        KeyCode::Enter => {
                            if let Some(path) = browser.select() {
                                return Ok(Some(path));
                            }
                        }
                        KeyCode::Esc | KeyCode::Char('q') => {
                            return Ok(None);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        EnableFocusChange
    )
    .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableBracketedPaste,
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
///
/// Each iteration is one display frame: the visualizer advances, the screen
/// is redrawn, then input is polled for up to 16 ms.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update_visualizer();
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press && handle_key(app, key.code, key.modifiers)
                    {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Paste(text) => app.handle_paste(&text),
                Event::FocusLost => app.handle_focus_lost(),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Handles mouse events.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    if app.show_help {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            MouseEventKind::ScrollUp => {
                app.help_scroll = app.help_scroll.saturating_sub(3);
            }
            MouseEventKind::ScrollDown => {
                app.help_scroll = app.help_scroll.saturating_add(3);
            }
            _ => {}
        }
        return;
    }
    if app.file_browser.open {
        match mouse.kind {
            MouseEventKind::ScrollUp => app.file_browser.move_up(),
            MouseEventKind::ScrollDown => app.file_browser.move_down(),
            _ => {}
        }
        return;
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.handle_mouse(MouseAction::Down, x, y);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_mouse(MouseAction::Drag, x, y);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.handle_mouse(MouseAction::Up, x, y);
        }
        MouseEventKind::Moved => {
            app.handle_mouse(MouseAction::Move, x, y);
        }
        MouseEventKind::ScrollUp => app.select_channel(-1),
        MouseEventKind::ScrollDown => app.select_channel(1),
        _ => {}
    }
}

/// Handles a key press event.
///
/// # Returns
///
/// `true` if the application should quit
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if app.show_help {
        match code {
            KeyCode::Char('?') | KeyCode::Esc => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll = app.help_scroll.saturating_add(1);
            }
            KeyCode::Home => app.help_scroll = 0,
            _ => {}
        }
        return false;
    }

    if app.file_browser.open {
        match code {
            KeyCode::Enter => app.file_browser_select(),
            KeyCode::Esc => app.file_browser_cancel(),
            KeyCode::Up | KeyCode::Char('k') => app.file_browser.move_up(),
            KeyCode::Down | KeyCode::Char('j') => app.file_browser.move_down(),
            _ => {}
        }
        return false;
    }

    if app.program_entry.is_some() {
        match code {
            KeyCode::Enter => app.commit_program_entry(),
            KeyCode::Esc => app.cancel_program_entry(),
            KeyCode::Backspace => app.program_entry_backspace(),
            KeyCode::Char(c) if !c.is_control() => app.program_entry_input(c),
            _ => {}
        }
        return false;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => app.show_help = true,

        // Transport
        KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('s') => app.stop(),
        KeyCode::Left => app.seek_by(-SEEK_STEP_SECS),
        KeyCode::Right => app.seek_by(SEEK_STEP_SECS),
        KeyCode::Home => app.seek_to(0.0),

        // Control panel
        KeyCode::Up | KeyCode::Char('k') => app.select_channel(-1),
        KeyCode::Down | KeyCode::Char('j') => app.select_channel(1),
        KeyCode::Tab => app.cycle_control(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_control(1),
        KeyCode::Char('-') => app.adjust_control(-1),
        KeyCode::PageUp => app.adjust_control(10),
        KeyCode::PageDown => app.adjust_control(-10),
        KeyCode::Char('<') | KeyCode::Char(',') => app.cycle_instrument(-1),
        KeyCode::Char('>') | KeyCode::Char('.') => app.cycle_instrument(1),
        KeyCode::Char('#') => app.start_program_entry(),

        KeyCode::Char('o') => app.open_file_browser(),
        KeyCode::Char('d') => app.toggle_theme(),
        _ => {}
    }
    false
}
