//! Piano keyboard geometry and key visuals.
//!
//! The keyboard is laid out in abstract units: every white key is one unit
//! wide and one unit tall, placed left to right without gaps. Black keys are
//! half as wide, 60% as tall, centred on the boundary between their white
//! neighbours and drawn above them, so they win hit tests where they overlap.

use crate::midi::{is_black_key, NOTE_COUNT};
use std::fmt;
use std::sync::Arc;

pub const WHITE_KEY_WIDTH: f32 = 1.0;
pub const WHITE_KEY_HEIGHT: f32 = 1.0;
pub const BLACK_KEY_WIDTH: f32 = 0.5;
pub const BLACK_KEY_HEIGHT: f32 = 0.6;

/// Hue of an active key, in degrees.
const ACTIVE_HUE: f32 = 200.0;
/// Saturation of an active key, in percent.
const ACTIVE_SATURATION: f32 = 80.0;

/// A position on the keyboard in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangle covered by one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyRect {
    pub note: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub black: bool,
}

impl KeyRect {
    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Static geometry of a keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardLayout {
    /// Indexed by note number.
    keys: Vec<KeyRect>,
    white_keys: usize,
}

impl KeyboardLayout {
    /// Lays out `total_keys` keys starting at note 0.
    pub fn new(total_keys: usize) -> Self {
        let total_keys = total_keys.min(NOTE_COUNT);
        let mut keys = Vec::with_capacity(total_keys);
        let mut white_x = 0.0;
        // Right edge of the most recent white key
        let mut last_white_end = 0.0;

        for index in 0..total_keys {
            let note = index as u8;
            if is_black_key(note) {
                keys.push(KeyRect {
                    note,
                    x: last_white_end - BLACK_KEY_WIDTH / 2.0,
                    y: 0.0,
                    width: BLACK_KEY_WIDTH,
                    height: BLACK_KEY_HEIGHT,
                    black: true,
                });
            } else {
                keys.push(KeyRect {
                    note,
                    x: white_x,
                    y: 0.0,
                    width: WHITE_KEY_WIDTH,
                    height: WHITE_KEY_HEIGHT,
                    black: false,
                });
                white_x += WHITE_KEY_WIDTH;
                last_white_end = white_x;
            }
        }

        let white_keys = keys.iter().filter(|k| !k.black).count();
        Self { keys, white_keys }
    }

    /// All keys, indexed by note number.
    pub fn keys(&self) -> &[KeyRect] {
        &self.keys
    }

    pub fn key(&self, note: u8) -> Option<&KeyRect> {
        self.keys.get(note as usize)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn white_key_count(&self) -> usize {
        self.white_keys
    }

    /// Total width in layout units.
    pub fn width(&self) -> f32 {
        self.white_keys as f32 * WHITE_KEY_WIDTH
    }

    /// Total height in layout units.
    pub fn height(&self) -> f32 {
        WHITE_KEY_HEIGHT
    }

    /// Returns the key under `point`, black keys first.
    pub fn hit_test(&self, point: Point) -> Option<u8> {
        self.keys
            .iter()
            .filter(|k| k.black)
            .chain(self.keys.iter().filter(|k| !k.black))
            .find(|k| k.contains(point))
            .map(|k| k.note)
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::new(NOTE_COUNT)
    }
}

/// A colour in HSL space (hue in degrees, saturation and lightness in percent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    /// Converts to 8-bit RGB.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = self.saturation / 100.0;
        let l = self.lightness / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = (self.hue.rem_euclid(360.0)) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Fill colour of a key pressed at `velocity`: brighter for harder presses.
pub fn key_fill(velocity: u8) -> Hsl {
    let velocity = velocity.min(127) as f32;
    Hsl {
        hue: ACTIVE_HUE,
        saturation: ACTIVE_SATURATION,
        lightness: 30.0 + 40.0 * (velocity / 127.0),
    }
}

/// Rendered state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyVisual {
    /// Default style, no fill.
    #[default]
    Idle,
    /// Filled with a velocity-derived colour.
    Active { velocity: u8 },
}

impl KeyVisual {
    /// Returns the fill override, or `None` for the default style.
    pub fn fill(&self) -> Option<Hsl> {
        match *self {
            KeyVisual::Idle => None,
            KeyVisual::Active { velocity } => Some(key_fill(velocity)),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, KeyVisual::Active { .. })
    }
}

/// A keyboard that can be drawn and hit-tested, independent of the UI toolkit.
pub trait RenderableKeyboard {
    /// Static key geometry.
    fn layout(&self) -> &KeyboardLayout;

    /// Returns the topmost key under `point`.
    fn hit_test(&self, point: Point) -> Option<u8> {
        self.layout().hit_test(point)
    }

    /// Changes how one key is drawn.
    fn set_key_visual(&mut self, note: u8, visual: KeyVisual);

    /// Returns how one key is drawn.
    fn key_visual(&self, note: u8) -> KeyVisual;

    /// Returns every key to its default style.
    fn clear_keys(&mut self);
}

/// The keyboard used by the terminal UI: shared geometry plus per-key visuals.
#[derive(Debug, Clone)]
pub struct KeyboardSurface {
    layout: Arc<KeyboardLayout>,
    visuals: [KeyVisual; NOTE_COUNT],
}

impl KeyboardSurface {
    pub fn new(layout: Arc<KeyboardLayout>) -> Self {
        Self {
            layout,
            visuals: [KeyVisual::Idle; NOTE_COUNT],
        }
    }

    /// Notes currently drawn active.
    pub fn active_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.visuals
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .map(|(note, _)| note as u8)
    }
}

impl Default for KeyboardSurface {
    fn default() -> Self {
        Self::new(Arc::new(KeyboardLayout::default()))
    }
}

impl RenderableKeyboard for KeyboardSurface {
    fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    fn set_key_visual(&mut self, note: u8, visual: KeyVisual) {
        if let Some(slot) = self.visuals.get_mut(note as usize) {
            *slot = visual;
        }
    }

    fn key_visual(&self, note: u8) -> KeyVisual {
        self.visuals
            .get(note as usize)
            .copied()
            .unwrap_or_default()
    }

    fn clear_keys(&mut self) {
        self.visuals.fill(KeyVisual::Idle);
    }
}
