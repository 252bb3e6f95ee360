//! Replays the timeline onto the channel keyboards and control displays.
//!
//! The visualizer never calls the synthesizer: the engine schedules timeline
//! audio itself. It follows the engine's transport clock one frame at a time,
//! applying every event whose start time plus the start delay has passed.

use super::channel::{ChannelBank, ControlKind, DEFAULT_EXPRESSION, DEFAULT_PAN, DEFAULT_VOLUME};
use super::surface::{KeyVisual, RenderableKeyboard};
use crate::audio::TransportClock;
use crate::midi::{EventKind, Timeline, TimelineEvent, CC_EXPRESSION, CC_PAN, CC_VOLUME};

/// A control change other parts of the UI must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlNotification {
    /// A channel's program display changed; the instrument selector and the
    /// synthesizer's program should resynchronize.
    ProgramChanged { channel: u8, program: u8 },
}

/// Result of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Run again next frame.
    Continue,
    /// Playback is not active; keys were cleared and the loop stopped.
    Stopped,
}

/// Replay cursor plus the per-frame scheduling flag.
#[derive(Debug, Clone, Default)]
pub struct TimelineVisualizer {
    /// Index of the next event not yet applied.
    cursor: usize,
    /// Whether the frame loop is running.
    scheduled: bool,
}

impl TimelineVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Playback started from the beginning.
    pub fn start(&mut self) {
        self.cursor = 0;
        self.scheduled = true;
    }

    /// Playback resumed; the cursor is kept.
    pub fn resume(&mut self) {
        self.scheduled = true;
    }

    /// Rewinds for a new timeline without starting the loop.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.scheduled = false;
    }

    /// Moves the cursor to the first event at or after `time`.
    ///
    /// All key visuals are cleared; skipped notes are not redrawn. Each
    /// channel's volume, pan, expression and program displays are restored to
    /// their last value before the new cursor (or the channel default), and a
    /// notification is returned for every program display that changed.
    pub fn seek<K: RenderableKeyboard>(
        &mut self,
        timeline: &Timeline,
        time: f64,
        bank: &mut ChannelBank<K>,
    ) -> Vec<ControlNotification> {
        bank.clear_all_keys();
        self.cursor = timeline.queue_index(time);

        let state = timeline.control_state_at(self.cursor);
        let mut notifications = Vec::new();
        for (number, controls) in state.iter().enumerate() {
            let Some(channel) = bank.channel_mut(number as u8) else {
                continue;
            };
            channel.set_control(ControlKind::Volume, controls.volume.unwrap_or(DEFAULT_VOLUME));
            channel.set_control(ControlKind::Pan, controls.pan.unwrap_or(DEFAULT_PAN));
            channel.set_control(
                ControlKind::Expression,
                controls.expression.unwrap_or(DEFAULT_EXPRESSION),
            );
            let program = controls.program.unwrap_or(0);
            if channel.program != program {
                channel.set_control(ControlKind::Program, program);
                notifications.push(ControlNotification::ProgramChanged {
                    channel: number as u8,
                    program,
                });
            }
        }
        tracing::debug!(time, cursor = self.cursor, "Visualizer seek");
        notifications
    }

    /// Runs one frame.
    ///
    /// Applies every due event in order, pushing control notifications into
    /// `notifications`. When `playing` is false the keys are cleared and the
    /// loop stops rescheduling.
    pub fn frame<K: RenderableKeyboard>(
        &mut self,
        playing: bool,
        clock: &dyn TransportClock,
        timeline: &Timeline,
        bank: &mut ChannelBank<K>,
        notifications: &mut Vec<ControlNotification>,
    ) -> FrameOutcome {
        if !self.scheduled {
            return FrameOutcome::Stopped;
        }
        if !playing {
            bank.clear_all_keys();
            self.scheduled = false;
            return FrameOutcome::Stopped;
        }

        let now = clock.current_time();
        let delay = clock.start_delay();
        while let Some(event) = timeline.get(self.cursor) {
            if event.start_time + delay > now {
                break;
            }
            apply_event(event, bank, notifications);
            self.cursor += 1;
        }
        FrameOutcome::Continue
    }
}

fn apply_event<K: RenderableKeyboard>(
    event: &TimelineEvent,
    bank: &mut ChannelBank<K>,
    notifications: &mut Vec<ControlNotification>,
) {
    let Some(channel) = bank.channel_mut(event.channel) else {
        return;
    };
    match event.kind {
        EventKind::NoteOn { note, velocity } => {
            channel
                .keyboard
                .set_key_visual(note, KeyVisual::Active { velocity });
        }
        EventKind::NoteOff { note, .. } => {
            channel.keyboard.set_key_visual(note, KeyVisual::Idle);
        }
        EventKind::Controller { controller, value } => match controller {
            CC_VOLUME => channel.set_control(ControlKind::Volume, value),
            CC_PAN => channel.set_control(ControlKind::Pan, value),
            CC_EXPRESSION => channel.set_control(ControlKind::Expression, value),
            _ => {}
        },
        EventKind::ProgramChange { program } => {
            channel.set_control(ControlKind::Program, program);
            notifications.push(ControlNotification::ProgramChanged {
                channel: event.channel,
                program,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piano::testing::{KeyCall, RecordingKeyboard};
    use std::cell::Cell;

    struct FakeClock {
        now: Cell<f64>,
        delay: f64,
    }

    impl FakeClock {
        fn new(delay: f64) -> Self {
            Self {
                now: Cell::new(0.0),
                delay,
            }
        }

        fn set(&self, time: f64) {
            self.now.set(time);
        }
    }

    impl TransportClock for FakeClock {
        fn current_time(&self) -> f64 {
            self.now.get()
        }

        fn start_delay(&self) -> f64 {
            self.delay
        }
    }

    fn on(t: f64, note: u8, velocity: u8) -> TimelineEvent {
        TimelineEvent::new(t, 0, EventKind::NoteOn { note, velocity })
    }

    fn off(t: f64, note: u8) -> TimelineEvent {
        TimelineEvent::new(t, 0, EventKind::NoteOff { note, velocity: 0 })
    }

    fn two_note_timeline() -> Timeline {
        Timeline::new(vec![on(0.0, 60, 100), off(0.5, 60), on(0.5, 64, 80)])
    }

    fn recording_bank() -> ChannelBank<RecordingKeyboard> {
        ChannelBank::with_keyboards(|_| RecordingKeyboard::default())
    }

    #[test]
    fn test_replay_order() {
        let timeline = two_note_timeline();
        let clock = FakeClock::new(0.0);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        let mut notes = Vec::new();
        vis.start();

        let mut t = 0.0;
        while t <= 1.0 {
            clock.set(t);
            let outcome = vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
            assert_eq!(outcome, FrameOutcome::Continue);
            if t < 0.5 {
                assert_eq!(vis.cursor(), 1);
            }
            t += 1.0 / 60.0;
        }

        assert_eq!(vis.cursor(), 3);
        assert_eq!(
            bank.channel(0).unwrap().keyboard.calls,
            vec![
                KeyCall::Set(60, KeyVisual::Active { velocity: 100 }),
                KeyCall::Set(60, KeyVisual::Idle),
                KeyCall::Set(64, KeyVisual::Active { velocity: 80 }),
            ]
        );
        assert!(notes.is_empty());
    }

    #[test]
    fn test_start_delay_holds_events() {
        let timeline = two_note_timeline();
        let clock = FakeClock::new(0.1);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        let mut notes = Vec::new();
        vis.start();

        clock.set(0.05);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 0);
        clock.set(0.1);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 1);
        clock.set(0.59);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 1);
        clock.set(0.6);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 3);
    }

    #[test]
    fn test_seek_past_end() {
        let timeline = two_note_timeline();
        let clock = FakeClock::new(0.0);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        let mut notes = Vec::new();
        vis.start();

        vis.seek(&timeline, 10.0, &mut bank);
        assert_eq!(vis.cursor(), timeline.len());

        clock.set(20.0);
        for _ in 0..3 {
            assert_eq!(
                vis.frame(true, &clock, &timeline, &mut bank, &mut notes),
                FrameOutcome::Continue
            );
        }
        assert_eq!(vis.cursor(), timeline.len());
        assert_eq!(bank.channel(0).unwrap().keyboard.calls, vec![KeyCall::Clear]);
    }

    #[test]
    fn test_seek_clears_without_replaying_notes() {
        let timeline = two_note_timeline();
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        vis.start();

        vis.seek(&timeline, 0.25, &mut bank);
        assert_eq!(vis.cursor(), 1);
        assert!(bank.iter().all(|c| c.keyboard.calls == vec![KeyCall::Clear]));
    }

    #[test]
    fn test_pause_resume_keeps_cursor() {
        let timeline = two_note_timeline();
        let clock = FakeClock::new(0.0);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        let mut notes = Vec::new();
        vis.start();

        clock.set(0.2);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 1);

        assert_eq!(
            vis.frame(false, &clock, &timeline, &mut bank, &mut notes),
            FrameOutcome::Stopped
        );
        assert!(!vis.is_scheduled());
        assert_eq!(vis.cursor(), 1);
        // Further frames do nothing until resumed.
        clock.set(0.7);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 1);

        vis.resume();
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 3);
        assert_eq!(
            bank.channel(0).unwrap().keyboard.calls,
            vec![
                KeyCall::Set(60, KeyVisual::Active { velocity: 100 }),
                KeyCall::Clear,
                KeyCall::Set(60, KeyVisual::Idle),
                KeyCall::Set(64, KeyVisual::Active { velocity: 80 }),
            ]
        );
    }

    #[test]
    fn test_start_rewinds() {
        let timeline = two_note_timeline();
        let clock = FakeClock::new(0.0);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        let mut notes = Vec::new();
        vis.start();
        clock.set(1.0);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);
        assert_eq!(vis.cursor(), 3);
        vis.start();
        assert_eq!(vis.cursor(), 0);
    }

    #[test]
    fn test_controls_and_program_notifications() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(0.0, 3, EventKind::Controller { controller: 7, value: 90 }),
            TimelineEvent::new(0.0, 3, EventKind::Controller { controller: 10, value: 20 }),
            TimelineEvent::new(0.0, 3, EventKind::Controller { controller: 11, value: 70 }),
            TimelineEvent::new(0.0, 3, EventKind::Controller { controller: 1, value: 5 }),
            TimelineEvent::new(0.1, 3, EventKind::ProgramChange { program: 40 }),
        ]);
        let clock = FakeClock::new(0.0);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();
        let mut notes = Vec::new();
        vis.start();
        clock.set(1.0);
        vis.frame(true, &clock, &timeline, &mut bank, &mut notes);

        let ch = bank.channel(3).unwrap();
        assert_eq!((ch.volume, ch.pan, ch.expression, ch.program), (90, 20, 70, 40));
        assert!(ch.keyboard.calls.is_empty());
        assert_eq!(
            notes,
            vec![ControlNotification::ProgramChanged { channel: 3, program: 40 }]
        );
    }

    #[test]
    fn test_seek_restores_controls() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(0.0, 1, EventKind::ProgramChange { program: 10 }),
            TimelineEvent::new(0.0, 1, EventKind::Controller { controller: 7, value: 50 }),
            TimelineEvent::new(2.0, 1, EventKind::ProgramChange { program: 20 }),
            TimelineEvent::new(2.0, 1, EventKind::Controller { controller: 7, value: 110 }),
        ]);
        let mut bank = recording_bank();
        let mut vis = TimelineVisualizer::new();

        let notes = vis.seek(&timeline, 3.0, &mut bank);
        assert_eq!(bank.channel(1).unwrap().volume, 110);
        assert_eq!(
            notes,
            vec![ControlNotification::ProgramChanged { channel: 1, program: 20 }]
        );

        let notes = vis.seek(&timeline, 1.0, &mut bank);
        assert_eq!(bank.channel(1).unwrap().volume, 50);
        assert_eq!(bank.channel(1).unwrap().program, 10);
        assert_eq!(notes.len(), 1);

        let notes = vis.seek(&timeline, 0.0, &mut bank);
        assert_eq!(bank.channel(1).unwrap().volume, DEFAULT_VOLUME);
        assert_eq!(
            notes,
            vec![ControlNotification::ProgramChanged { channel: 1, program: 0 }]
        );
        // Unchanged programs stay quiet.
        assert!(vis.seek(&timeline, 0.0, &mut bank).is_empty());
    }
}
