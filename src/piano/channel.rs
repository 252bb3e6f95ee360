//! Per-channel state shared by live input and timeline replay.
//!
//! A [`ChannelBank`] is the single context object for all sixteen channels.
//! The live input router owns the pressed-state tables; both the router and
//! the visualizer draw on the keyboards and the control displays.

use super::router::RouterState;
use super::surface::{KeyboardLayout, KeyboardSurface, RenderableKeyboard};
use crate::midi::{CHANNEL_COUNT, NOTE_COUNT};
use std::sync::Arc;

/// Default channel volume display.
pub const DEFAULT_VOLUME: u8 = 100;
/// Default pan display (centre).
pub const DEFAULT_PAN: u8 = 64;
/// Default expression display.
pub const DEFAULT_EXPRESSION: u8 = 127;

/// A control shown in a channel's panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlKind {
    #[default]
    Volume,
    Expression,
    Pan,
    Program,
}

impl ControlKind {
    /// Next control in panel order.
    pub fn next(self) -> Self {
        match self {
            ControlKind::Volume => ControlKind::Expression,
            ControlKind::Expression => ControlKind::Pan,
            ControlKind::Pan => ControlKind::Program,
            ControlKind::Program => ControlKind::Volume,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlKind::Volume => "Vol",
            ControlKind::Expression => "Exp",
            ControlKind::Pan => "Pan",
            ControlKind::Program => "Prg",
        }
    }
}

/// Parses program number input typed into a channel panel.
pub fn parse_program_input(text: &str) -> Option<u8> {
    text.trim().parse::<u8>().ok().filter(|p| *p < 128)
}

/// One channel: pressed notes, router state, keyboard and control displays.
#[derive(Debug, Clone)]
pub struct ChannelState<K = KeyboardSurface> {
    /// Channel number (0-15).
    pub number: u8,
    /// Notes held by live input.
    pub pressed: [bool; NOTE_COUNT],
    /// Key captured by the tracked pointer.
    pub router: RouterState,
    pub keyboard: K,
    pub volume: u8,
    pub pan: u8,
    pub expression: u8,
    pub program: u8,
    /// Set when the last typed program number was rejected.
    pub program_invalid: bool,
}

impl<K: RenderableKeyboard> ChannelState<K> {
    pub fn new(number: u8, keyboard: K) -> Self {
        Self {
            number,
            pressed: [false; NOTE_COUNT],
            router: RouterState::Idle,
            keyboard,
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            expression: DEFAULT_EXPRESSION,
            program: 0,
            program_invalid: false,
        }
    }

    /// Returns true if live input holds `note`.
    pub fn is_pressed(&self, note: u8) -> bool {
        self.pressed.get(note as usize).copied().unwrap_or(false)
    }

    /// Number of notes held by live input.
    pub fn pressed_count(&self) -> usize {
        self.pressed.iter().filter(|p| **p).count()
    }

    /// Current value of a numeric control.
    pub fn control(&self, kind: ControlKind) -> u8 {
        match kind {
            ControlKind::Volume => self.volume,
            ControlKind::Expression => self.expression,
            ControlKind::Pan => self.pan,
            ControlKind::Program => self.program,
        }
    }

    /// Sets a control display, clamped to 0-127.
    pub fn set_control(&mut self, kind: ControlKind, value: u8) {
        let value = value.min(127);
        match kind {
            ControlKind::Volume => self.volume = value,
            ControlKind::Expression => self.expression = value,
            ControlKind::Pan => self.pan = value,
            ControlKind::Program => {
                self.program = value;
                self.program_invalid = false;
            }
        }
    }

    /// Applies typed program input, marking the panel invalid on rejection.
    ///
    /// # Returns
    ///
    /// The accepted program number, or `None` if the input was invalid
    pub fn apply_program_input(&mut self, text: &str) -> Option<u8> {
        match parse_program_input(text) {
            Some(program) => {
                self.set_control(ControlKind::Program, program);
                Some(program)
            }
            None => {
                self.program_invalid = true;
                None
            }
        }
    }
}

/// All sixteen channels.
#[derive(Debug, Clone)]
pub struct ChannelBank<K = KeyboardSurface> {
    channels: Vec<ChannelState<K>>,
}

impl ChannelBank<KeyboardSurface> {
    /// Creates sixteen channels sharing one 128-key layout.
    pub fn new() -> Self {
        let layout = Arc::new(KeyboardLayout::default());
        Self::with_keyboards(|_| KeyboardSurface::new(Arc::clone(&layout)))
    }
}

impl Default for ChannelBank<KeyboardSurface> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RenderableKeyboard> ChannelBank<K> {
    /// Creates sixteen channels with keyboards from `make_keyboard`.
    pub fn with_keyboards(mut make_keyboard: impl FnMut(u8) -> K) -> Self {
        let channels = (0..CHANNEL_COUNT as u8)
            .map(|n| ChannelState::new(n, make_keyboard(n)))
            .collect();
        Self { channels }
    }

    pub fn channel(&self, number: u8) -> Option<&ChannelState<K>> {
        self.channels.get(number as usize)
    }

    pub fn channel_mut(&mut self, number: u8) -> Option<&mut ChannelState<K>> {
        self.channels.get_mut(number as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelState<K>> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Returns every key of every channel to its default style.
    pub fn clear_all_keys(&mut self) {
        for channel in &mut self.channels {
            channel.keyboard.clear_keys();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piano::surface::KeyVisual;

    #[test]
    fn test_bank_creation() {
        let bank = ChannelBank::new();
        assert_eq!(bank.len(), 16);
        let ch = bank.channel(9).unwrap();
        assert_eq!(ch.number, 9);
        assert_eq!(ch.volume, DEFAULT_VOLUME);
        assert_eq!(ch.pan, DEFAULT_PAN);
        assert_eq!(ch.pressed_count(), 0);
        assert!(bank.channel(16).is_none());
    }

    #[test]
    fn test_clear_all_keys() {
        let mut bank = ChannelBank::new();
        for n in [0u8, 5, 15] {
            bank.channel_mut(n)
                .unwrap()
                .keyboard
                .set_key_visual(60, KeyVisual::Active { velocity: 90 });
        }
        bank.clear_all_keys();
        assert!(bank.iter().all(|c| c.keyboard.active_notes().count() == 0));
    }

    #[test]
    fn test_parse_program_input() {
        assert_eq!(parse_program_input("0"), Some(0));
        assert_eq!(parse_program_input(" 127 "), Some(127));
        assert_eq!(parse_program_input("128"), None);
        assert_eq!(parse_program_input("-1"), None);
        assert_eq!(parse_program_input("abc"), None);
        assert_eq!(parse_program_input(""), None);
    }

    #[test]
    fn test_invalid_program_marks_only_that_channel() {
        let mut bank = ChannelBank::new();
        bank.channel_mut(2).unwrap().program = 7;

        assert_eq!(bank.channel_mut(2).unwrap().apply_program_input("300"), None);
        assert!(bank.channel(2).unwrap().program_invalid);
        assert_eq!(bank.channel(2).unwrap().program, 7);
        assert!(!bank.channel(3).unwrap().program_invalid);

        assert_eq!(bank.channel_mut(2).unwrap().apply_program_input("24"), Some(24));
        assert!(!bank.channel(2).unwrap().program_invalid);
        assert_eq!(bank.channel(2).unwrap().program, 24);
    }

    #[test]
    fn test_control_cycle() {
        let mut kind = ControlKind::default();
        for _ in 0..4 {
            kind = kind.next();
        }
        assert_eq!(kind, ControlKind::Volume);
        let mut ch = ChannelState::new(0, KeyboardSurface::default());
        ch.set_control(ControlKind::Pan, 200);
        assert_eq!(ch.control(ControlKind::Pan), 127);
    }
}
