//! Elements the formatter works on.
//!
//! Tickables are grouped into Voices. Voices with equal duration
//! budgets are then handed to the formatter, which aligns them on a
//! shared integer tick timeline.

pub mod fraction_tools;
pub mod modifier;
pub mod tickable;
pub mod ticks;
pub mod voice;

pub use fraction_tools::{fraction_parts, fraction_to_f64, gcd, lcm};
pub use modifier::{
    JazzPlacement, Modifier, ModifierKind, ModifierShift, OrnamentStyle,
};
pub use tickable::{Note, Tickable, TickableMetrics};
pub use ticks::{Ticks, RESOLUTION};
pub use voice::{Voice, VoiceMode, VoiceTime, DEFAULT_SOFTMAX_FACTOR};
