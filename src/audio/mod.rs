//! Audio engine for MIDI synthesis and playback.
//!
//! This module provides real-time MIDI synthesis using rustysynth
//! and audio output via rodio. It supports:
//! - Loading several SoundFonts and routing programs to the one that has them
//! - Lazily fetching missing instrument banks before a program change
//! - Timeline playback scheduled on the audio thread
//! - Live note input on any channel
//!
//! The [`SynthEngine`] and [`TransportClock`] traits are the seams the
//! keyboard router and visualizer talk to, so they can run against a test
//! double instead of an audio device.

pub mod engine;
pub mod soundfont;

pub use engine::{AudioEngine, PlaybackState, START_DELAY};
pub use soundfont::SoundFontTable;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the synthesis engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to open SoundFont {path}: {source}")]
    SoundFontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse SoundFont {path}: {message}")]
    SoundFontParse { path: PathBuf, message: String },
    #[error("failed to create synthesizer: {0}")]
    Synthesizer(String),
    #[error("no SoundFont provides program {program} (bank {bank}), looked in {dir}")]
    MissingBank {
        program: u8,
        bank: u16,
        dir: PathBuf,
    },
    #[error("audio output error: {0}")]
    Output(String),
}

/// Note and control calls into a synthesizer.
pub trait SynthEngine {
    /// Starts a note.
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8);

    /// Releases a note.
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8);

    /// Silences every sounding note on one channel immediately.
    fn stop_channel_notes(&mut self, channel: u8);

    /// Channel volume (CC 7).
    fn set_volume(&mut self, channel: u8, value: u8);

    /// Channel pan (CC 10).
    fn set_pan(&mut self, channel: u8, value: u8);

    /// Channel expression (CC 11).
    fn set_expression(&mut self, channel: u8, value: u8);

    /// Selects an instrument, loading its bank first if no SoundFont has it.
    fn set_program_change(&mut self, channel: u8, program: u8) -> Result<(), EngineError>;

    /// Whether audio output is currently suspended.
    fn is_suspended(&self) -> bool;

    /// Suspends audio output to save resources while idle.
    fn suspend(&mut self) -> Result<(), EngineError>;

    /// Resumes suspended audio output.
    fn resume(&mut self) -> Result<(), EngineError>;
}

/// Playback clock of the engine's timeline scheduler.
pub trait TransportClock {
    /// Seconds of playback since the transport last started from zero.
    fn current_time(&self) -> f64;

    /// Fixed offset added to every event start time before it is due.
    fn start_delay(&self) -> f64;
}

/// Recording engine double for tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::{EngineError, SynthEngine};

    /// A call observed by [`RecordingEngine`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        NoteOn(u8, u8, u8),
        NoteOff(u8, u8),
        StopChannel(u8),
        Volume(u8, u8),
        Pan(u8, u8),
        Expression(u8, u8),
        Program(u8, u8),
        Suspend,
        Resume,
    }

    /// Records every call instead of producing sound.
    #[derive(Debug, Default)]
    pub struct RecordingEngine {
        pub calls: Vec<Call>,
        pub suspended: bool,
    }

    impl RecordingEngine {
        pub fn suspended() -> Self {
            Self {
                calls: Vec::new(),
                suspended: true,
            }
        }

        pub fn note_ons(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::NoteOn(..)))
                .count()
        }

        pub fn note_offs(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::NoteOff(..)))
                .count()
        }
    }

    impl SynthEngine for RecordingEngine {
        fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
            assert!(!self.suspended, "note-on issued while suspended");
            self.calls.push(Call::NoteOn(channel, note, velocity));
        }

        fn note_off(&mut self, channel: u8, note: u8, _velocity: u8) {
            self.calls.push(Call::NoteOff(channel, note));
        }

        fn stop_channel_notes(&mut self, channel: u8) {
            self.calls.push(Call::StopChannel(channel));
        }

        fn set_volume(&mut self, channel: u8, value: u8) {
            self.calls.push(Call::Volume(channel, value));
        }

        fn set_pan(&mut self, channel: u8, value: u8) {
            self.calls.push(Call::Pan(channel, value));
        }

        fn set_expression(&mut self, channel: u8, value: u8) {
            self.calls.push(Call::Expression(channel, value));
        }

        fn set_program_change(&mut self, channel: u8, program: u8) -> Result<(), EngineError> {
            self.calls.push(Call::Program(channel, program));
            Ok(())
        }

        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn suspend(&mut self) -> Result<(), EngineError> {
            self.suspended = true;
            self.calls.push(Call::Suspend);
            Ok(())
        }

        fn resume(&mut self) -> Result<(), EngineError> {
            self.suspended = false;
            self.calls.push(Call::Resume);
            Ok(())
        }
    }
}
