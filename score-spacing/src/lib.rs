//! Horizontal spacing of music notation.
//!
//! Tickables (notes, rests, anything that takes musical time) are grouped
//! into [Voice](primitives::Voice)s. The [Formatter](formatter::Formatter)
//! lines simultaneous tickables of all voices up in columns, gives every
//! column the room its widest member needs, and spreads the columns over
//! the target width so that longer notes take more space. A
//! [System](system::System) does the same for several staves at once.

pub mod contexts;
pub mod error;
pub mod formatter;
pub mod primitives;
pub mod system;

pub use error::{FormatError, FormatResult};
pub use formatter::{Formatter, FormatterOptions};
pub use system::{System, SystemOptions};
