//! Live pointer input on a channel keyboard.
//!
//! One tracked pointer per channel moves through a two-state machine:
//! `Idle` or `Holding(note)`. Each transition issues at most one note-off for
//! the key being left and at most one note-on for the key being entered, so
//! note-on and note-off calls always pair up once the pointer goes idle.

use super::channel::ChannelState;
use super::surface::{KeyVisual, Point, RenderableKeyboard};
use crate::audio::{EngineError, SynthEngine};

/// Velocity used when the device reports no pressure.
pub const DEFAULT_VELOCITY: u8 = 64;

/// Key captured by a channel's tracked pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouterState {
    #[default]
    Idle,
    Holding(u8),
}

impl RouterState {
    pub fn held_note(self) -> Option<u8> {
        match self {
            RouterState::Idle => None,
            RouterState::Holding(note) => Some(note),
        }
    }
}

/// Pointer lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Move,
    Release,
    /// The pointer left the keyboard.
    Leave,
    /// The host took the pointer away (focus loss and the like).
    Cancel,
}

/// A pointer event in keyboard layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Position on the keyboard, `None` when outside it.
    pub point: Option<Point>,
    /// Normalized pressure in 0.0..=1.0, 0.0 when unsupported.
    pub pressure: f32,
    /// Whether a button is held.
    pub buttons: bool,
}

impl PointerEvent {
    pub fn press(point: Point) -> Self {
        Self {
            kind: PointerKind::Press,
            point: Some(point),
            pressure: 0.0,
            buttons: true,
        }
    }

    pub fn drag(point: Option<Point>) -> Self {
        Self {
            kind: PointerKind::Move,
            point,
            pressure: 0.0,
            buttons: true,
        }
    }

    pub fn hover(point: Option<Point>) -> Self {
        Self {
            kind: PointerKind::Move,
            point,
            pressure: 0.0,
            buttons: false,
        }
    }

    pub fn release(point: Option<Point>) -> Self {
        Self {
            kind: PointerKind::Release,
            point,
            pressure: 0.0,
            buttons: false,
        }
    }

    pub fn leave() -> Self {
        Self {
            kind: PointerKind::Leave,
            point: None,
            pressure: 0.0,
            buttons: false,
        }
    }

    pub fn cancel() -> Self {
        Self {
            kind: PointerKind::Cancel,
            point: None,
            pressure: 0.0,
            buttons: false,
        }
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn velocity(&self) -> u8 {
        velocity_from_pressure(self.pressure)
    }
}

/// Maps pointer pressure to a note velocity.
///
/// `ceil(pressure * 127)`, falling back to [`DEFAULT_VELOCITY`] when the
/// result is not positive.
pub fn velocity_from_pressure(pressure: f32) -> u8 {
    let scaled = (pressure * 127.0).ceil();
    if scaled.is_nan() || scaled <= 0.0 {
        DEFAULT_VELOCITY
    } else {
        scaled.min(127.0) as u8
    }
}

/// Routes pointer events into note calls on a synthesizer.
pub struct LiveInputRouter<'a, E: SynthEngine + ?Sized> {
    engine: &'a mut E,
    /// Whether timeline playback is running.
    playing: bool,
}

impl<'a, E: SynthEngine + ?Sized> LiveInputRouter<'a, E> {
    pub fn new(engine: &'a mut E, playing: bool) -> Self {
        Self { engine, playing }
    }

    /// Applies one pointer event to a channel.
    pub fn handle<K: RenderableKeyboard>(
        &mut self,
        channel: &mut ChannelState<K>,
        event: PointerEvent,
    ) -> Result<(), EngineError> {
        let velocity = event.velocity();
        match event.kind {
            PointerKind::Press => {
                self.ensure_resumed()?;
                if let RouterState::Holding(held) = channel.router {
                    self.release_note(channel, held, velocity);
                }
                let target = event.point.and_then(|p| channel.keyboard.hit_test(p));
                if let Some(note) = target {
                    self.press_note(channel, note, velocity);
                }
            }
            PointerKind::Move => {
                if !event.buttons {
                    // A hover while holding means the release went elsewhere.
                    if let RouterState::Holding(held) = channel.router {
                        self.release_note(channel, held, velocity);
                    }
                    return Ok(());
                }
                self.ensure_resumed()?;
                let target = event.point.and_then(|p| channel.keyboard.hit_test(p));
                match (channel.router, target) {
                    (RouterState::Holding(held), Some(note)) if held == note => {}
                    (RouterState::Holding(held), Some(note)) => {
                        self.release_note(channel, held, velocity);
                        self.press_note(channel, note, velocity);
                    }
                    (RouterState::Holding(held), None) => {
                        self.release_note(channel, held, velocity);
                    }
                    (RouterState::Idle, Some(note)) => {
                        self.press_note(channel, note, velocity);
                    }
                    (RouterState::Idle, None) => {}
                }
            }
            PointerKind::Release => {
                if let RouterState::Holding(held) = channel.router {
                    self.release_note(channel, held, velocity);
                }
            }
            PointerKind::Leave | PointerKind::Cancel => {
                if let RouterState::Holding(held) = channel.router {
                    self.release_note(channel, held, velocity);
                }
                if !self.playing {
                    self.release_all(channel)?;
                }
            }
        }
        Ok(())
    }

    fn ensure_resumed(&mut self) -> Result<(), EngineError> {
        if self.engine.is_suspended() {
            tracing::debug!("resuming audio output for live input");
            self.engine.resume()?;
        }
        Ok(())
    }

    fn press_note<K: RenderableKeyboard>(
        &mut self,
        channel: &mut ChannelState<K>,
        note: u8,
        velocity: u8,
    ) {
        channel.router = RouterState::Holding(note);
        let Some(slot) = channel.pressed.get_mut(note as usize) else {
            return;
        };
        if *slot {
            return;
        }
        *slot = true;
        channel
            .keyboard
            .set_key_visual(note, KeyVisual::Active { velocity });
        self.engine.note_on(channel.number, note, velocity);
    }

    fn release_note<K: RenderableKeyboard>(
        &mut self,
        channel: &mut ChannelState<K>,
        note: u8,
        velocity: u8,
    ) {
        channel.router = RouterState::Idle;
        let Some(slot) = channel.pressed.get_mut(note as usize) else {
            return;
        };
        if !*slot {
            return;
        }
        *slot = false;
        channel.keyboard.set_key_visual(note, KeyVisual::Idle);
        self.engine.note_off(channel.number, note, velocity);
    }

    /// Silences the channel, drops every pressed entry and suspends output.
    fn release_all<K: RenderableKeyboard>(
        &mut self,
        channel: &mut ChannelState<K>,
    ) -> Result<(), EngineError> {
        self.engine.stop_channel_notes(channel.number);
        for (note, pressed) in channel.pressed.iter_mut().enumerate() {
            if *pressed {
                *pressed = false;
                channel.keyboard.set_key_visual(note as u8, KeyVisual::Idle);
            }
        }
        channel.router = RouterState::Idle;
        if !self.engine.is_suspended() {
            self.engine.suspend()?;
        }
        Ok(())
    }
}
