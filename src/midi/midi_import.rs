//! Standard MIDI File (SMF) import.
//!
//! Flattens .mid and .midi files into a [`Timeline`] of absolute-time
//! events. Supports SMF Format 0 (single track) and Format 1 (multi-track),
//! with metrical or SMPTE timecode timing and a full tempo map.
//!
//! # Limitations
//!
//! - Only note on/off, controller and program change messages are kept
//! - Pitch bend, aftertouch, SysEx and meta events other than tempo are ignored

use super::{EventKind, Timeline, TimelineEvent};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default tempo (120 BPM) in microseconds per beat.
const DEFAULT_USEC_PER_BEAT: u32 = 500_000;

/// Errors that can occur during MIDI import.
#[derive(Debug, Error)]
pub enum MidiImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// MIDI parsing failed
    #[error("MIDI parse error: {0}")]
    ParseError(String),
    /// Unsupported MIDI format or timing
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// How file ticks convert into seconds.
#[derive(Debug, Clone, Copy)]
enum TickClock {
    /// Ticks per beat; seconds depend on the current tempo.
    Metrical { ticks_per_beat: u32 },
    /// Fixed duration per tick, tempo events are irrelevant.
    Timecode { seconds_per_tick: f64 },
}

impl TickClock {
    fn seconds(&self, ticks: u64, usec_per_beat: u32) -> f64 {
        match *self {
            TickClock::Metrical { ticks_per_beat } => {
                ticks as f64 * usec_per_beat as f64 / ticks_per_beat as f64 / 1_000_000.0
            }
            TickClock::Timecode { seconds_per_tick } => ticks as f64 * seconds_per_tick,
        }
    }
}

/// An event at an absolute tick, before tempo resolution.
#[derive(Debug, Clone, Copy)]
enum RawKind {
    Tempo(u32),
    Channel(u8, EventKind),
}

/// Imports a MIDI file from disk.
///
/// # Arguments
///
/// * `path` - Path to the .mid or .midi file
///
/// # Errors
///
/// Returns error if file cannot be read or parsed
pub fn import_from_midi<P: AsRef<Path>>(path: P) -> Result<Timeline, MidiImportError> {
    let data = fs::read(path.as_ref())?;
    import_from_bytes(&data)
}

/// Imports a MIDI file already held in memory.
pub fn import_from_bytes(data: &[u8]) -> Result<Timeline, MidiImportError> {
    let smf = Smf::parse(data).map_err(|e| MidiImportError::ParseError(e.to_string()))?;

    if smf.header.format == Format::Sequential {
        return Err(MidiImportError::UnsupportedFormat(
            "Format 2 (sequential) MIDI files not supported".to_string(),
        ));
    }

    let clock = match smf.header.timing {
        Timing::Metrical(tpb) => {
            let ticks_per_beat = tpb.as_int() as u32;
            if ticks_per_beat == 0 {
                return Err(MidiImportError::UnsupportedFormat(
                    "zero ticks per beat".to_string(),
                ));
            }
            TickClock::Metrical { ticks_per_beat }
        }
        Timing::Timecode(fps, subframes) => TickClock::Timecode {
            seconds_per_tick: 1.0 / (fps.as_f32() as f64 * subframes.max(1) as f64),
        },
    };

    // Gather every track into one list of absolute ticks. Tracks are visited
    // in file order so the tempo track wins ties at the same tick.
    let mut raw: Vec<(u64, RawKind)> = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    let usec_per_beat = tempo.as_int();
                    if usec_per_beat > 0 {
                        raw.push((tick, RawKind::Tempo(usec_per_beat)));
                    }
                }
                TrackEventKind::Midi { channel, message } => {
                    if let Some(kind) = convert_message(message) {
                        raw.push((tick, RawKind::Channel(channel.as_int(), kind)));
                    }
                }
                _ => {} // Ignore SysEx and other events
            }
        }
    }
    raw.sort_by_key(|(tick, _)| *tick);

    let mut events = Vec::with_capacity(raw.len());
    let mut seconds = 0.0;
    let mut last_tick: u64 = 0;
    let mut usec_per_beat = DEFAULT_USEC_PER_BEAT;
    for (tick, kind) in raw {
        seconds += clock.seconds(tick - last_tick, usec_per_beat);
        last_tick = tick;
        match kind {
            RawKind::Tempo(tempo) => usec_per_beat = tempo,
            RawKind::Channel(channel, kind) => {
                events.push(TimelineEvent::new(seconds, channel, kind));
            }
        }
    }

    tracing::debug!(events = events.len(), "Imported MIDI timeline");
    Ok(Timeline::new(events))
}

/// Maps a channel message to a timeline event kind.
fn convert_message(message: MidiMessage) -> Option<EventKind> {
    match message {
        MidiMessage::NoteOn { key, vel } => {
            let note = key.as_int();
            let velocity = vel.as_int();
            // Note on with velocity 0 = note off
            if velocity > 0 {
                Some(EventKind::NoteOn { note, velocity })
            } else {
                Some(EventKind::NoteOff { note, velocity: 0 })
            }
        }
        MidiMessage::NoteOff { key, vel } => Some(EventKind::NoteOff {
            note: key.as_int(),
            velocity: vel.as_int(),
        }),
        MidiMessage::Controller { controller, value } => Some(EventKind::Controller {
            controller: controller.as_int(),
            value: value.as_int(),
        }),
        MidiMessage::ProgramChange { program } => Some(EventKind::ProgramChange {
            program: program.as_int(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an SMF byte stream from raw track bodies.
    fn smf(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&format.to_be_bytes());
        data.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
        data.extend_from_slice(&division.to_be_bytes());
        for body in tracks {
            data.extend_from_slice(b"MTrk");
            data.extend_from_slice(&(body.len() as u32).to_be_bytes());
            data.extend_from_slice(body);
        }
        data
    }

    #[test]
    fn test_single_track_import() {
        let track: &[u8] = &[
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo 500000
            0x00, 0xC0, 0x05, // program change 5
            0x00, 0x90, 0x3C, 0x64, // note on 60 vel 100
            0x83, 0x60, 0x80, 0x3C, 0x40, // +480: note off 60
            0x00, 0x90, 0x40, 0x50, // note on 64 vel 80
            0x83, 0x60, 0x90, 0x40, 0x00, // +480: note on vel 0
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let timeline = import_from_bytes(&smf(0, 480, &[track])).unwrap();
        let events = timeline.events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].kind, EventKind::ProgramChange { program: 5 });
        assert_eq!(
            events[1].kind,
            EventKind::NoteOn {
                note: 60,
                velocity: 100
            }
        );
        assert!((events[2].start_time - 0.5).abs() < 1e-9);
        assert_eq!(
            events[2].kind,
            EventKind::NoteOff {
                note: 60,
                velocity: 64
            }
        );
        assert_eq!(
            events[3].kind,
            EventKind::NoteOn {
                note: 64,
                velocity: 80
            }
        );
        assert!((events[4].start_time - 1.0).abs() < 1e-9);
        assert_eq!(
            events[4].kind,
            EventKind::NoteOff {
                note: 64,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_tempo_map_across_tracks() {
        let tempo_track: &[u8] = &[
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 120 BPM
            0x83, 0x60, 0xFF, 0x51, 0x03, 0x03, 0xD0, 0x90, // +480: 240 BPM
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let music_track: &[u8] = &[
            0x00, 0x91, 0x3C, 0x64, // channel 1 note on
            0x87, 0x40, 0x81, 0x3C, 0x40, // +960: note off
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let timeline = import_from_bytes(&smf(1, 480, &[tempo_track, music_track])).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.events()[0].channel, 1);
        // 480 ticks at 0.5 s/beat + 480 ticks at 0.25 s/beat
        assert!((timeline.total_time() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_sequential_format_rejected() {
        let track: &[u8] = &[0x00, 0xFF, 0x2F, 0x00];
        let result = import_from_bytes(&smf(2, 480, &[track]));
        assert!(matches!(result, Err(MidiImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let result = import_from_bytes(b"not a midi file");
        assert!(matches!(result, Err(MidiImportError::ParseError(_))));
    }
}
