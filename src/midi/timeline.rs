//! Immutable, time-ordered playback timeline.
//!
//! A timeline is produced once per loaded MIDI file and then only read:
//! the audio thread schedules sound from it and the visualizer replays
//! its visual effects. Both walk it with their own cursor.

use super::{bank_for_channel, CC_BANK_SELECT_LSB, CC_EXPRESSION, CC_PAN, CC_VOLUME, CHANNEL_COUNT};

/// Type-specific payload of a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Key pressed.
    NoteOn { note: u8, velocity: u8 },
    /// Key released.
    NoteOff { note: u8, velocity: u8 },
    /// Controller change (volume, pan, expression, bank select, ...).
    Controller { controller: u8, value: u8 },
    /// Program (instrument) change.
    ProgramChange { program: u8 },
}

/// A single scheduled event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEvent {
    /// Start time in seconds from the beginning of the file.
    pub start_time: f64,
    /// Channel (0-15).
    pub channel: u8,
    /// What happens at `start_time`.
    pub kind: EventKind,
}

impl TimelineEvent {
    pub fn new(start_time: f64, channel: u8, kind: EventKind) -> Self {
        Self {
            start_time,
            channel,
            kind,
        }
    }
}

/// Last known control values of one channel at some point of the timeline.
/// `None` means no event of that kind occurred yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelControls {
    pub volume: Option<u8>,
    pub pan: Option<u8>,
    pub expression: Option<u8>,
    pub program: Option<u8>,
}

/// Ordered sequence of playback events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Creates a timeline, ordering events by start time.
    ///
    /// The sort is stable, so events sharing a start time keep the order in
    /// which they were supplied (a note-off followed by a note-on of the same
    /// key at the same instant stays in that order).
    pub fn new(mut events: Vec<TimelineEvent>) -> Self {
        events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Self { events }
    }

    /// Returns all events in order.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Returns the event at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&TimelineEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Start time of the last event in seconds (0 for an empty timeline).
    pub fn total_time(&self) -> f64 {
        self.events.last().map(|e| e.start_time).unwrap_or(0.0)
    }

    /// Index of the first event starting at or after `time`.
    ///
    /// Returns `len()` when every event starts before `time`.
    pub fn queue_index(&self, time: f64) -> usize {
        self.events.partition_point(|e| e.start_time < time)
    }

    /// Computes each channel's last known controls among events `[0, index)`.
    pub fn control_state_at(&self, index: usize) -> [ChannelControls; CHANNEL_COUNT] {
        let mut state = [ChannelControls::default(); CHANNEL_COUNT];
        let end = index.min(self.events.len());
        for event in &self.events[..end] {
            let Some(controls) = state.get_mut(event.channel as usize) else {
                continue;
            };
            match event.kind {
                EventKind::Controller { controller, value } => match controller {
                    CC_VOLUME => controls.volume = Some(value),
                    CC_PAN => controls.pan = Some(value),
                    CC_EXPRESSION => controls.expression = Some(value),
                    _ => {}
                },
                EventKind::ProgramChange { program } => controls.program = Some(program),
                _ => {}
            }
        }
        state
    }

    /// Lists the distinct (program, bank) pairs selected anywhere in the
    /// timeline, tracking bank select LSB per channel.
    pub fn programs_used(&self) -> Vec<(u8, u16)> {
        let mut bank_lsb = [0u8; CHANNEL_COUNT];
        let mut used: Vec<(u8, u16)> = Vec::new();
        for event in &self.events {
            let ch = event.channel as usize;
            if ch >= CHANNEL_COUNT {
                continue;
            }
            match event.kind {
                EventKind::Controller {
                    controller: CC_BANK_SELECT_LSB,
                    value,
                } => bank_lsb[ch] = value,
                EventKind::ProgramChange { program } => {
                    let entry = (program, bank_for_channel(event.channel, bank_lsb[ch]));
                    if !used.contains(&entry) {
                        used.push(entry);
                    }
                }
                _ => {}
            }
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::DRUM_BANK;

    fn on(t: f64, note: u8) -> TimelineEvent {
        TimelineEvent::new(t, 0, EventKind::NoteOn { note, velocity: 100 })
    }

    fn off(t: f64, note: u8) -> TimelineEvent {
        TimelineEvent::new(t, 0, EventKind::NoteOff { note, velocity: 0 })
    }

    #[test]
    fn test_events_sorted_stably() {
        let timeline = Timeline::new(vec![on(1.0, 62), off(0.5, 60), on(0.5, 64), on(0.0, 60)]);
        let times: Vec<f64> = timeline.events().iter().map(|e| e.start_time).collect();
        assert_eq!(times, vec![0.0, 0.5, 0.5, 1.0]);
        // Same start time keeps insertion order
        assert_eq!(
            timeline.events()[1].kind,
            EventKind::NoteOff {
                note: 60,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_queue_index() {
        let timeline = Timeline::new(vec![on(0.0, 60), off(0.5, 60), on(0.5, 64), off(2.0, 64)]);
        assert_eq!(timeline.queue_index(0.0), 0);
        assert_eq!(timeline.queue_index(0.25), 1);
        assert_eq!(timeline.queue_index(0.5), 1);
        assert_eq!(timeline.queue_index(1.0), 3);
        assert_eq!(timeline.queue_index(10.0), timeline.len());
        assert_eq!(timeline.total_time(), 2.0);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::default();
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_time(), 0.0);
        assert_eq!(timeline.queue_index(3.0), 0);
    }

    #[test]
    fn test_control_state_at() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(0.0, 1, EventKind::Controller { controller: 7, value: 90 }),
            TimelineEvent::new(0.1, 1, EventKind::ProgramChange { program: 40 }),
            TimelineEvent::new(0.2, 1, EventKind::Controller { controller: 7, value: 50 }),
            TimelineEvent::new(0.3, 2, EventKind::Controller { controller: 10, value: 0 }),
            TimelineEvent::new(0.4, 2, EventKind::Controller { controller: 64, value: 127 }),
        ]);

        let state = timeline.control_state_at(2);
        assert_eq!(state[1].volume, Some(90));
        assert_eq!(state[1].program, Some(40));
        assert_eq!(state[2], ChannelControls::default());

        let state = timeline.control_state_at(timeline.len() + 5);
        assert_eq!(state[1].volume, Some(50));
        assert_eq!(state[2].pan, Some(0));
        assert_eq!(state[2].expression, None);
    }

    #[test]
    fn test_programs_used() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(0.0, 0, EventKind::ProgramChange { program: 0 }),
            TimelineEvent::new(0.0, 1, EventKind::Controller { controller: 32, value: 8 }),
            TimelineEvent::new(0.1, 1, EventKind::ProgramChange { program: 4 }),
            TimelineEvent::new(0.2, 9, EventKind::ProgramChange { program: 0 }),
            TimelineEvent::new(0.3, 0, EventKind::ProgramChange { program: 0 }),
        ]);
        assert_eq!(
            timeline.programs_used(),
            vec![(0, 0), (4, 8), (0, DRUM_BANK)]
        );
    }
}
