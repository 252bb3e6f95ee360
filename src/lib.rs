//! midiviz - A terminal MIDI player with sixteen playable keyboards.
//!
//! This library provides the keyboard, live input and playback visualization
//! core along with the audio engine and terminal UI built on it.

pub mod app;
pub mod audio;
pub mod loader;
pub mod midi;
pub mod piano;
pub mod prefs;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{AudioEngine, EngineError, SynthEngine, TransportClock};
pub use midi::{EventKind, Timeline, TimelineEvent};
pub use piano::{ChannelBank, KeyboardSurface, LiveInputRouter, TimelineVisualizer};
