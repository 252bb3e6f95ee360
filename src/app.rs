//! Application state and event handling.
//!
//! The [`App`] is the single controller: it owns the audio engine, the
//! channel bank shared by live input and timeline replay, the visualizer,
//! the loaded timeline and the theme preference, and it translates terminal
//! mouse events into pointer events for the live input router.

use crate::audio::{AudioEngine, PlaybackState, SynthEngine, TransportClock, START_DELAY};
use crate::loader::{self, FileKind, FileTarget, LoadError};
use crate::midi::{import_from_midi, Timeline, CHANNEL_COUNT};
use crate::piano::{
    ChannelBank, ControlKind, ControlNotification, KeyboardLayout, LiveInputRouter, Point,
    PointerEvent, RenderableKeyboard, TimelineVisualizer,
};
use crate::prefs::{self, JsonFileStore, MemoryStore, PreferenceStore, Theme};
use anyhow::{Context, Result};
use ratatui::layout::Rect;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Seconds the arrow keys move the transport.
pub const SEEK_STEP_SECS: f64 = 5.0;

/// Extra time after the last event before playback is considered finished.
const END_GRACE_SECS: f64 = 1.0;

/// How long a status message stays visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Which files a browser lists besides directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFilter {
    /// MIDI files and SoundFonts.
    Loadable,
    /// SoundFonts only.
    SoundFonts,
}

impl BrowserFilter {
    pub fn accepts(self, path: &Path) -> bool {
        match (self, FileKind::detect(path)) {
            (BrowserFilter::Loadable, Some(_)) => true,
            (BrowserFilter::SoundFonts, Some(FileKind::SoundFont)) => true,
            _ => false,
        }
    }
}

/// State for a file browser dialog.
#[derive(Debug, Clone)]
pub struct FileBrowserState {
    /// Whether the browser is open.
    pub open: bool,
    pub filter: BrowserFilter,
    /// Current directory path.
    pub current_dir: PathBuf,
    /// Entries in the current directory: `..`, directories, then files.
    pub entries: Vec<PathBuf>,
    /// Currently selected index.
    pub selected: usize,
    /// Scroll offset for long lists.
    pub scroll: usize,
    /// Rows the list had when last drawn.
    pub visible_rows: usize,
}

impl FileBrowserState {
    pub fn new(filter: BrowserFilter) -> Self {
        Self {
            open: false,
            filter,
            current_dir: std::env::current_dir().unwrap_or_default(),
            entries: Vec::new(),
            selected: 0,
            scroll: 0,
            visible_rows: 10,
        }
    }

    /// Opens the browser in `dir`.
    pub fn open_at(&mut self, dir: PathBuf) {
        self.open = true;
        self.current_dir = dir;
        self.selected = 0;
        self.scroll = 0;
        self.refresh();
    }

    /// Re-reads the current directory.
    pub fn refresh(&mut self) {
        self.entries.clear();

        if self.current_dir.parent().is_some() {
            self.entries.push(PathBuf::from(".."));
        }

        if let Ok(entries) = std::fs::read_dir(&self.current_dir) {
            let mut dirs: Vec<PathBuf> = Vec::new();
            let mut files: Vec<PathBuf> = Vec::new();

            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    dirs.push(path);
                } else if self.filter.accepts(&path) {
                    files.push(path);
                }
            }

            dirs.sort();
            files.sort();

            self.entries.extend(dirs);
            self.entries.extend(files);
        }

        if self.selected >= self.entries.len() {
            self.selected = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.scroll {
                self.scroll = self.selected;
            }
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
            let rows = self.visible_rows.max(1);
            if self.selected >= self.scroll + rows {
                self.scroll = self.selected + 1 - rows;
            }
        }
    }

    /// Enters the selected directory, or returns the selected file.
    pub fn select(&mut self) -> Option<PathBuf> {
        let selected = self.entries.get(self.selected)?.clone();

        if selected == Path::new("..") {
            if let Some(parent) = self.current_dir.parent() {
                let parent = parent.to_path_buf();
                self.open_at(parent);
            }
            None
        } else if selected.is_dir() {
            self.open_at(selected);
            None
        } else {
            self.open = false;
            Some(selected)
        }
    }
}

/// Screen regions used for mouse hit testing, updated every frame.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// The transport bar at the top.
    pub transport: Rect,
    /// The clickable seek bar inside the transport.
    pub seek_bar: Rect,
    /// Keyboard area of each visible channel.
    pub keyboards: Vec<(u8, Rect)>,
}

impl LayoutRegions {
    fn contains(rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    /// Returns the channel whose keyboard holds the cell, with the cell's
    /// position in keyboard layout units.
    pub fn keyboard_at(&self, x: u16, y: u16, layout: &KeyboardLayout) -> Option<(u8, Point)> {
        self.keyboards
            .iter()
            .find(|(_, rect)| Self::contains(*rect, x, y))
            .map(|(channel, rect)| (*channel, cell_point(*rect, x, y, layout)))
    }

    /// Returns the fraction of the total time a click on the seek bar selects.
    pub fn seek_fraction(&self, x: u16, y: u16) -> Option<f64> {
        if !Self::contains(self.seek_bar, x, y) {
            return None;
        }
        let span = self.seek_bar.width.saturating_sub(1).max(1) as f64;
        Some(((x - self.seek_bar.x) as f64 / span).clamp(0.0, 1.0))
    }
}

/// Maps the centre of a terminal cell inside `area` to keyboard layout units.
pub fn cell_point(area: Rect, x: u16, y: u16, layout: &KeyboardLayout) -> Point {
    let col = x.saturating_sub(area.x) as f32 + 0.5;
    let row = y.saturating_sub(area.y) as f32 + 0.5;
    Point::new(
        col / area.width.max(1) as f32 * layout.width(),
        row / area.height.max(1) as f32 * layout.height(),
    )
}

/// Mouse activity as the pointer tracker sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Drag,
    Up,
    /// Motion with no button held.
    Move,
    /// The terminal lost focus.
    FocusLost,
}

/// Follows the one mouse pointer across channel keyboards.
///
/// Produces the pointer events each channel's router must see: the pointer
/// leaving a keyboard, held button or not, is a `Leave` for it; entering
/// another with the button held is a move that presses the key under the
/// pointer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    /// Channel whose keyboard currently has the pointer.
    channel: Option<u8>,
}

impl PointerTracker {
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    /// Translates mouse activity over `target` into per-channel events.
    pub fn translate(
        &mut self,
        action: MouseAction,
        target: Option<(u8, Point)>,
    ) -> Vec<(u8, PointerEvent)> {
        let mut events = Vec::new();
        match action {
            MouseAction::Down => {
                let entered = target.map(|(channel, _)| channel);
                if let Some(previous) = self.channel.filter(|c| Some(*c) != entered) {
                    events.push((previous, PointerEvent::leave()));
                }
                self.channel = entered;
                if let Some((channel, point)) = target {
                    events.push((channel, PointerEvent::press(point)));
                }
            }
            MouseAction::Drag => self.motion(target, PointerEvent::drag, &mut events),
            MouseAction::Move => self.motion(target, PointerEvent::hover, &mut events),
            MouseAction::Up => {
                if let Some(current) = self.channel {
                    let point = target.filter(|(c, _)| *c == current).map(|(_, p)| p);
                    events.push((current, PointerEvent::release(point)));
                    if point.is_none() {
                        events.push((current, PointerEvent::leave()));
                        self.channel = None;
                    }
                }
            }
            MouseAction::FocusLost => {
                if let Some(current) = self.channel.take() {
                    events.push((current, PointerEvent::cancel()));
                }
            }
        }
        events
    }

    fn motion(
        &mut self,
        target: Option<(u8, Point)>,
        event: fn(Option<Point>) -> PointerEvent,
        events: &mut Vec<(u8, PointerEvent)>,
    ) {
        match (self.channel, target) {
            (Some(current), Some((channel, point))) if current == channel => {
                events.push((channel, event(Some(point))));
            }
            (current, target) => {
                if let Some(current) = current {
                    events.push((current, PointerEvent::leave()));
                }
                self.channel = target.map(|(channel, _)| channel);
                if let Some((channel, point)) = target {
                    events.push((channel, event(Some(point))));
                }
            }
        }
    }
}

/// Main application state.
pub struct App {
    /// The audio engine for playback and live input.
    pub audio: AudioEngine,
    /// Per-channel pressed tables, keyboards and control displays.
    pub channels: ChannelBank,
    visualizer: TimelineVisualizer,
    timeline: Arc<Timeline>,
    /// Path of the loaded MIDI file.
    pub midi_path: Option<PathBuf>,
    /// Instrument name shown next to each channel's program number.
    pub instrument_names: Vec<String>,
    pub theme: Theme,
    prefs: Box<dyn PreferenceStore>,
    /// Channel the control panel keys act on.
    pub selected_channel: u8,
    pub focused_control: ControlKind,
    /// Program number being typed, if entry is active.
    pub program_entry: Option<String>,
    /// First channel row drawn.
    pub channel_scroll: usize,
    /// Status message to display.
    pub status_message: Option<(String, Instant)>,
    /// Layout regions for mouse hit testing (updated each frame).
    pub layout: LayoutRegions,
    pointer: PointerTracker,
    /// File picker for MIDI files and SoundFonts.
    pub file_browser: FileBrowserState,
    pub show_help: bool,
    /// Help menu scroll offset.
    pub help_scroll: u16,
}

impl App {
    /// Creates the application.
    ///
    /// # Arguments
    ///
    /// * `soundfont_path` - SoundFont loaded at startup
    /// * `soundfont_dir` - Directory searched for per-program banks
    /// * `prefs_path` - JSON file holding the theme preference
    ///
    /// # Errors
    ///
    /// Returns error if the audio engine cannot be initialized
    pub fn new(soundfont_path: &Path, soundfont_dir: PathBuf, prefs_path: &Path) -> Result<Self> {
        let audio = AudioEngine::new(soundfont_path, soundfont_dir)
            .context("Failed to initialize audio engine")?;

        let prefs: Box<dyn PreferenceStore> = match JsonFileStore::open(prefs_path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(?prefs_path, "Preferences unavailable, not persisting: {}", e);
                Box::new(MemoryStore::default())
            }
        };
        let theme = prefs::load_theme(prefs.as_ref());

        let mut app = Self {
            audio,
            channels: ChannelBank::new(),
            visualizer: TimelineVisualizer::new(),
            timeline: Arc::new(Timeline::default()),
            midi_path: None,
            instrument_names: Vec::new(),
            theme,
            prefs,
            selected_channel: 0,
            focused_control: ControlKind::default(),
            program_entry: None,
            channel_scroll: 0,
            status_message: None,
            layout: LayoutRegions::default(),
            pointer: PointerTracker::default(),
            file_browser: FileBrowserState::new(BrowserFilter::Loadable),
            show_help: false,
            help_scroll: 0,
        };
        app.refresh_instrument_names();
        Ok(app)
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn report(&mut self, what: &str, error: impl std::fmt::Display) {
        tracing::error!("{}: {}", what, error);
        self.set_status(format!("{}: {}", what, error));
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn visualizer(&self) -> &TimelineVisualizer {
        &self.visualizer
    }

    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
    }

    // ==================== Transport ====================

    /// Space: play, pause, or resume.
    pub fn toggle_playback(&mut self) {
        match self.audio.playback_state() {
            PlaybackState::Stopped => self.play(),
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
        }
    }

    /// Starts the timeline from the beginning.
    pub fn play(&mut self) {
        if self.timeline.is_empty() {
            self.set_status("No MIDI file loaded");
            return;
        }
        match self.audio.play() {
            Ok(()) => {
                self.visualizer.start();
                tracing::debug!("Playback started");
            }
            Err(e) => self.report("Playback failed", e),
        }
    }

    /// Pauses playback; the visualizer stops on its next frame.
    pub fn pause(&mut self) {
        self.audio.pause();
        tracing::debug!(cursor = self.visualizer.cursor(), "Playback paused");
    }

    /// Continues from the paused position.
    pub fn resume(&mut self) {
        match self.audio.resume_playback() {
            Ok(()) => self.visualizer.resume(),
            Err(e) => self.report("Resume failed", e),
        }
    }

    /// Stops playback and rewinds.
    pub fn stop(&mut self) {
        self.audio.stop();
        self.visualizer.reset();
        self.channels.clear_all_keys();
    }

    /// Moves the transport to `time` seconds of the timeline.
    ///
    /// While stopped this cues the position for the next play.
    pub fn seek_to(&mut self, time: f64) {
        let time = time.clamp(0.0, self.timeline.total_time());
        self.audio.seek(time);
        let notifications = self
            .visualizer
            .seek(&self.timeline, time, &mut self.channels);
        self.apply_notifications(notifications);
    }

    /// Moves the transport by `delta` seconds.
    pub fn seek_by(&mut self, delta: f64) {
        self.seek_to(self.position_secs() + delta);
    }

    /// Moves the transport to a fraction of the total time.
    pub fn seek_fraction(&mut self, fraction: f64) {
        self.seek_to(fraction.clamp(0.0, 1.0) * self.timeline.total_time());
    }

    /// Playback position in seconds, without the start delay.
    pub fn position_secs(&self) -> f64 {
        (self.audio.current_time() - START_DELAY).max(0.0)
    }

    /// Runs one visualizer frame and stops playback past the end.
    pub fn update_visualizer(&mut self) {
        let playing = self.audio.is_playing();
        let mut notifications = Vec::new();
        self.visualizer.frame(
            playing,
            &self.audio,
            &self.timeline,
            &mut self.channels,
            &mut notifications,
        );
        self.apply_notifications(notifications);

        if playing
            && self.audio.current_time()
                > self.timeline.total_time() + START_DELAY + END_GRACE_SECS
        {
            self.stop();
            self.set_status("Playback finished");
        }
    }

    fn apply_notifications(&mut self, notifications: Vec<ControlNotification>) {
        for notification in notifications {
            match notification {
                ControlNotification::ProgramChanged { channel, program } => {
                    self.sync_program(channel, program);
                }
            }
        }
    }

    // ==================== Control panel ====================

    pub fn select_channel(&mut self, delta: i8) {
        let next = (self.selected_channel as i16 + delta as i16).clamp(0, CHANNEL_COUNT as i16 - 1);
        self.selected_channel = next as u8;
        self.program_entry = None;
    }

    pub fn cycle_control(&mut self) {
        self.focused_control = self.focused_control.next();
    }

    /// Adjusts the focused control of the selected channel.
    pub fn adjust_control(&mut self, delta: i16) {
        let channel = self.selected_channel;
        let kind = self.focused_control;
        if kind == ControlKind::Program {
            self.cycle_instrument(delta);
            return;
        }
        let Some(state) = self.channels.channel_mut(channel) else {
            return;
        };
        let value = (state.control(kind) as i16 + delta).clamp(0, 127) as u8;
        state.set_control(kind, value);
        match kind {
            ControlKind::Volume => self.audio.set_volume(channel, value),
            ControlKind::Expression => self.audio.set_expression(channel, value),
            ControlKind::Pan => self.audio.set_pan(channel, value),
            ControlKind::Program => {}
        }
    }

    /// Steps the selected channel's program, wrapping at the ends.
    pub fn cycle_instrument(&mut self, delta: i16) {
        let channel = self.selected_channel;
        let Some(state) = self.channels.channel(channel) else {
            return;
        };
        let program = (state.program as i16 + delta).rem_euclid(128) as u8;
        self.change_program(channel, program);
    }

    /// Sets a channel's program display and selects it on the synthesizer.
    pub fn change_program(&mut self, channel: u8, program: u8) {
        if let Some(state) = self.channels.channel_mut(channel) {
            state.set_control(ControlKind::Program, program);
        }
        self.sync_program(channel, program);
    }

    /// Brings the synthesizer and the instrument name in line with a
    /// program display.
    fn sync_program(&mut self, channel: u8, program: u8) {
        if let Err(e) = self.audio.set_program_change(channel, program) {
            self.report(&format!("Program change on channel {}", channel + 1), e);
        }
        let bank = self.audio.channel_bank(channel);
        let name = self.audio.instrument_name(program, bank);
        if let Some(slot) = self.instrument_names.get_mut(channel as usize) {
            *slot = name;
        }
    }

    fn refresh_instrument_names(&mut self) {
        self.instrument_names = self
            .channels
            .iter()
            .map(|state| {
                let bank = self.audio.channel_bank(state.number);
                self.audio.instrument_name(state.program, bank)
            })
            .collect();
    }

    pub fn start_program_entry(&mut self) {
        self.program_entry = Some(String::new());
    }

    pub fn program_entry_input(&mut self, c: char) {
        if let Some(entry) = self.program_entry.as_mut() {
            if entry.len() < 4 {
                entry.push(c);
            }
        }
    }

    pub fn program_entry_backspace(&mut self) {
        if let Some(entry) = self.program_entry.as_mut() {
            entry.pop();
        }
    }

    pub fn cancel_program_entry(&mut self) {
        self.program_entry = None;
    }

    /// Applies the typed program number to the selected channel.
    pub fn commit_program_entry(&mut self) {
        let Some(text) = self.program_entry.take() else {
            return;
        };
        let channel = self.selected_channel;
        let Some(state) = self.channels.channel_mut(channel) else {
            return;
        };
        match state.apply_program_input(&text) {
            Some(program) => self.sync_program(channel, program),
            None => {
                tracing::warn!(channel, input = %text, "Rejected program number");
                self.set_status(format!("Invalid program number: {}", text));
            }
        }
    }

    // ==================== Theme ====================

    pub fn toggle_theme(&mut self) {
        match prefs::toggle_dark_mode(self.prefs.as_mut()) {
            Ok(theme) => self.theme = theme,
            Err(e) => self.report("Failed to save preference", e),
        }
    }

    // ==================== Pointer input ====================

    /// Routes left-button mouse activity at a screen cell.
    ///
    /// # Returns
    ///
    /// true if the event was consumed by a keyboard or the seek bar
    pub fn handle_mouse(&mut self, action: MouseAction, x: u16, y: u16) -> bool {
        if action == MouseAction::Down {
            if let Some(fraction) = self.layout.seek_fraction(x, y) {
                for (channel, event) in self.pointer.translate(MouseAction::Move, None) {
                    self.route_pointer(channel, event);
                }
                self.seek_fraction(fraction);
                return true;
            }
        }

        let target = match self.channels.channel(0) {
            Some(state) => self.layout.keyboard_at(x, y, state.keyboard.layout()),
            None => return false,
        };
        if action == MouseAction::Down {
            if let Some((channel, _)) = target {
                self.selected_channel = channel;
            }
        }
        let events = self.pointer.translate(action, target);
        let consumed = !events.is_empty();
        for (channel, event) in events {
            self.route_pointer(channel, event);
        }
        consumed
    }

    /// The terminal lost focus: cancel the tracked pointer.
    pub fn handle_focus_lost(&mut self) {
        for (channel, event) in self.pointer.translate(MouseAction::FocusLost, None) {
            self.route_pointer(channel, event);
        }
    }

    fn route_pointer(&mut self, channel: u8, event: PointerEvent) {
        let playing = self.audio.is_playing();
        let Some(state) = self.channels.channel_mut(channel) else {
            return;
        };
        let mut router = LiveInputRouter::new(&mut self.audio, playing);
        if let Err(e) = router.handle(state, event) {
            self.report("Audio output", e);
        }
    }

    // ==================== Files ====================

    /// Loads a dropped, pasted or picked file by extension.
    pub fn load_path(&mut self, path: &Path) {
        match loader::load_file(self, path) {
            Ok(Some(kind)) => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                let what = match kind {
                    FileKind::Midi => "MIDI file",
                    FileKind::SoundFont => "SoundFont",
                };
                self.set_status(format!("Loaded {}: {}", what, name));
            }
            Ok(None) => {}
            Err(e) => self.report(&format!("Failed to load {}", path.display()), e),
        }
    }

    /// Loads every path in pasted text.
    pub fn handle_paste(&mut self, text: &str) {
        for path in loader::paths_from_paste(text) {
            self.load_path(Path::new(&path));
        }
    }

    pub fn open_file_browser(&mut self) {
        let dir = self
            .midi_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        self.file_browser.open_at(dir);
    }

    pub fn file_browser_select(&mut self) {
        if let Some(path) = self.file_browser.select() {
            self.load_path(&path);
        }
    }

    pub fn file_browser_cancel(&mut self) {
        self.file_browser.open = false;
    }
}

impl FileTarget for App {
    fn load_midi(&mut self, path: &Path) -> Result<(), LoadError> {
        self.stop();
        let timeline = Arc::new(import_from_midi(path)?);

        for (program, bank) in timeline.programs_used() {
            if let Err(e) = self.audio.ensure_bank(program, bank) {
                tracing::warn!(program, bank, "Instrument unavailable: {}", e);
            }
        }

        self.audio.load_timeline(Arc::clone(&timeline));
        self.timeline = timeline;
        self.visualizer.reset();
        let notifications = self
            .visualizer
            .seek(&self.timeline, 0.0, &mut self.channels);
        self.apply_notifications(notifications);
        self.midi_path = Some(path.to_path_buf());
        tracing::info!(
            ?path,
            events = self.timeline.len(),
            seconds = self.timeline.total_time(),
            "Loaded MIDI file"
        );
        Ok(())
    }

    fn load_soundfont(&mut self, path: &Path) -> Result<(), LoadError> {
        self.audio.load_soundfont(path)?;
        // Route every channel through the newest presets.
        let programs: Vec<(u8, u8)> = self
            .channels
            .iter()
            .map(|state| (state.number, state.program))
            .collect();
        for (channel, program) in programs {
            if let Err(e) = self.audio.set_program_change(channel, program) {
                tracing::warn!(channel, program, "Program unavailable: {}", e);
            }
        }
        self.refresh_instrument_names();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingEngine};

    fn regions() -> LayoutRegions {
        LayoutRegions {
            transport: Rect::new(0, 0, 100, 3),
            seek_bar: Rect::new(40, 1, 51, 1),
            keyboards: vec![(0, Rect::new(30, 4, 150, 2)), (1, Rect::new(30, 6, 150, 2))],
        }
    }

    #[test]
    fn test_keyboard_at_maps_cells_to_keys() {
        let layout = KeyboardLayout::default();
        let regions = regions();

        // Lower row of the first cell is the lowest white key.
        let (channel, point) = regions.keyboard_at(30, 5, &layout).unwrap();
        assert_eq!(channel, 0);
        assert_eq!(layout.hit_test(point), Some(0));

        // Second keyboard, upper row over C#: two cells per white key.
        let (channel, point) = regions.keyboard_at(31, 6, &layout).unwrap();
        assert_eq!(channel, 1);
        assert_eq!(layout.hit_test(point), Some(1));

        assert!(regions.keyboard_at(29, 5, &layout).is_none());
        assert!(regions.keyboard_at(30, 8, &layout).is_none());
    }

    #[test]
    fn test_seek_fraction() {
        let regions = regions();
        assert_eq!(regions.seek_fraction(40, 1), Some(0.0));
        assert_eq!(regions.seek_fraction(65, 1), Some(0.5));
        assert_eq!(regions.seek_fraction(90, 1), Some(1.0));
        assert_eq!(regions.seek_fraction(39, 1), None);
        assert_eq!(regions.seek_fraction(50, 2), None);
    }

    #[test]
    fn test_tracker_press_drag_release() {
        let mut tracker = PointerTracker::default();
        let p = Point::new(1.0, 0.8);

        let events = tracker.translate(MouseAction::Down, Some((2, p)));
        assert_eq!(events, vec![(2, PointerEvent::press(p))]);
        assert_eq!(tracker.channel(), Some(2));

        let events = tracker.translate(MouseAction::Drag, Some((2, p)));
        assert_eq!(events, vec![(2, PointerEvent::drag(Some(p)))]);

        let events = tracker.translate(MouseAction::Up, Some((2, p)));
        assert_eq!(events, vec![(2, PointerEvent::release(Some(p)))]);
        // Still over the keyboard after the release.
        assert_eq!(tracker.channel(), Some(2));

        let events = tracker.translate(MouseAction::Move, Some((2, p)));
        assert_eq!(events, vec![(2, PointerEvent::hover(Some(p)))]);
    }

    #[test]
    fn test_tracker_hover_exit_leaves() {
        let mut tracker = PointerTracker::default();
        let p = Point::new(4.0, 0.8);

        tracker.translate(MouseAction::Down, Some((0, p)));
        tracker.translate(MouseAction::Up, Some((0, p)));

        // Moving off the keyboard with no button held still leaves it.
        let events = tracker.translate(MouseAction::Move, None);
        assert_eq!(events, vec![(0, PointerEvent::leave())]);
        assert_eq!(tracker.channel(), None);
        assert!(tracker.translate(MouseAction::Move, None).is_empty());

        // Hovering across keyboards leaves each one in turn.
        tracker.translate(MouseAction::Move, Some((1, p)));
        let events = tracker.translate(MouseAction::Move, Some((2, p)));
        assert_eq!(
            events,
            vec![(1, PointerEvent::leave()), (2, PointerEvent::hover(Some(p)))]
        );
    }

    #[test]
    fn test_click_then_hover_away_suspends_output() {
        let mut engine = RecordingEngine::default();
        let mut bank = ChannelBank::new();
        let mut tracker = PointerTracker::default();
        let key = KeyboardLayout::default().key(60).copied().unwrap();
        let p = Point::new(key.x + key.width / 2.0, 0.8);

        for action in [MouseAction::Down, MouseAction::Up] {
            for (channel, event) in tracker.translate(action, Some((0, p))) {
                let state = bank.channel_mut(channel).unwrap();
                LiveInputRouter::new(&mut engine, false).handle(state, event).unwrap();
            }
        }
        assert!(!engine.suspended);

        for (channel, event) in tracker.translate(MouseAction::Move, None) {
            let state = bank.channel_mut(channel).unwrap();
            LiveInputRouter::new(&mut engine, false).handle(state, event).unwrap();
        }
        assert!(engine.suspended);
        assert_eq!(engine.calls.last(), Some(&Call::Suspend));
        assert_eq!(engine.note_ons(), engine.note_offs());
    }

    #[test]
    fn test_tracker_release_off_keyboard_leaves() {
        let mut tracker = PointerTracker::default();
        let p = Point::new(4.0, 0.8);

        tracker.translate(MouseAction::Down, Some((5, p)));
        let events = tracker.translate(MouseAction::Up, None);
        assert_eq!(
            events,
            vec![(5, PointerEvent::release(None)), (5, PointerEvent::leave())]
        );
        assert!(tracker.translate(MouseAction::Up, None).is_empty());
    }

    #[test]
    fn test_tracker_drag_between_keyboards() {
        let mut tracker = PointerTracker::default();
        let p = Point::new(10.0, 0.8);

        tracker.translate(MouseAction::Down, Some((0, p)));
        let events = tracker.translate(MouseAction::Drag, Some((1, p)));
        assert_eq!(
            events,
            vec![(0, PointerEvent::leave()), (1, PointerEvent::drag(Some(p)))]
        );
        assert_eq!(tracker.channel(), Some(1));

        let events = tracker.translate(MouseAction::Drag, None);
        assert_eq!(events, vec![(1, PointerEvent::leave())]);
        assert_eq!(tracker.channel(), None);

        // Dragging in from outside presses on entry.
        let events = tracker.translate(MouseAction::Drag, Some((3, p)));
        assert_eq!(events, vec![(3, PointerEvent::drag(Some(p)))]);
    }

    #[test]
    fn test_tracker_focus_lost_cancels() {
        let mut tracker = PointerTracker::default();
        tracker.translate(MouseAction::Down, Some((4, Point::new(3.0, 0.5))));
        assert_eq!(
            tracker.translate(MouseAction::FocusLost, None),
            vec![(4, PointerEvent::cancel())]
        );
        assert!(tracker.translate(MouseAction::FocusLost, None).is_empty());
    }

    #[test]
    fn test_browser_filter() {
        assert!(BrowserFilter::Loadable.accepts(Path::new("a.mid")));
        assert!(BrowserFilter::Loadable.accepts(Path::new("a.sf3")));
        assert!(!BrowserFilter::Loadable.accepts(Path::new("a.json")));
        assert!(BrowserFilter::SoundFonts.accepts(Path::new("a.SF2")));
        assert!(!BrowserFilter::SoundFonts.accepts(Path::new("a.midi")));
    }

    #[test]
    fn test_browser_scrolls_with_selection() {
        let mut browser = FileBrowserState::new(BrowserFilter::Loadable);
        browser.entries = (0..30).map(|i| PathBuf::from(format!("{}.mid", i))).collect();
        browser.visible_rows = 10;
        for _ in 0..12 {
            browser.move_down();
        }
        assert_eq!(browser.selected, 12);
        assert_eq!(browser.scroll, 3);
        for _ in 0..12 {
            browser.move_up();
        }
        assert_eq!(browser.selected, 0);
        assert_eq!(browser.scroll, 0);
    }
}
