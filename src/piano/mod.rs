//! Channel keyboards: geometry, live pointer input and timeline replay.
//!
//! Live input and timeline replay share one [`ChannelBank`]. Only live input
//! calls into the synthesizer; replay only draws keys and control displays.

pub mod channel;
pub mod router;
pub mod surface;
pub mod visualizer;

pub use channel::{ChannelBank, ChannelState, ControlKind};
pub use router::{LiveInputRouter, PointerEvent, PointerKind, RouterState, DEFAULT_VELOCITY};
pub use surface::{
    key_fill, Hsl, KeyRect, KeyVisual, KeyboardLayout, KeyboardSurface, Point, RenderableKeyboard,
};
pub use visualizer::{ControlNotification, FrameOutcome, TimelineVisualizer};
