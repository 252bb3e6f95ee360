//! MIDI data structures for the playback timeline.
//!
//! This module provides the note and channel constants shared by the
//! keyboard surface, the input router and the visualizer, plus the
//! immutable event timeline built from Standard MIDI Files.

mod midi_import;
mod timeline;

pub use midi_import::{import_from_bytes, import_from_midi, MidiImportError};
pub use timeline::{ChannelControls, EventKind, Timeline, TimelineEvent};

/// Number of note numbers on every channel.
pub const NOTE_COUNT: usize = 128;

/// Number of independent channels.
pub const CHANNEL_COUNT: usize = 16;

/// The General MIDI percussion channel (channel 10, zero-based 9).
pub const DRUM_CHANNEL: u8 = 9;

/// Bank number used for percussion presets.
pub const DRUM_BANK: u16 = 128;

/// Controller number for channel volume.
pub const CC_VOLUME: u8 = 7;

/// Controller number for pan.
pub const CC_PAN: u8 = 10;

/// Controller number for expression.
pub const CC_EXPRESSION: u8 = 11;

/// Controller number for bank select LSB.
pub const CC_BANK_SELECT_LSB: u8 = 32;

/// Pitch classes that sit on white keys.
pub const WHITE_PITCH_CLASSES: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Pitch classes that sit on black keys.
pub const BLACK_PITCH_CLASSES: [u8; 5] = [1, 3, 6, 8, 10];

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Arguments
///
/// * `note` - MIDI note number (0-127)
///
/// # Returns
///
/// String representation like "C4" or "F#5"
///
/// # Examples
///
/// ```
/// use midiviz::midi::note_to_name;
///
/// let name = note_to_name(60); // Middle C
/// assert_eq!(name, "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Returns true if the note sits on a black key.
#[inline]
pub fn is_black_key(note: u8) -> bool {
    BLACK_PITCH_CLASSES.contains(&(note % 12))
}

/// Returns the bank used to look up presets for a channel.
///
/// The drum channel always resolves to the percussion bank; other channels
/// use their bank select LSB.
#[inline]
pub fn bank_for_channel(channel: u8, bank_lsb: u8) -> u16 {
    if channel == DRUM_CHANNEL {
        DRUM_BANK
    } else {
        bank_lsb as u16
    }
}
