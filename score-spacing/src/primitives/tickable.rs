//! The contract every timed element fulfils, and a plain implementation.

use super::{Modifier, Ticks};

/// Intrinsic horizontal footprint of a tickable, in pixels.
///
/// `mod_left_px`/`mod_right_px` hold the room taken by modifiers the
/// tickable sizes itself; shifts coming from a joined ModifierContext
/// are added on top by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickableMetrics {
    pub note_px: f64,
    pub left_displaced_head_px: f64,
    pub right_displaced_head_px: f64,
    pub mod_left_px: f64,
    pub mod_right_px: f64,
}
impl TickableMetrics {
    pub fn new(note_px: f64) -> Self {
        Self {
            note_px,
            ..Default::default()
        }
    }
    pub fn total_left_px(&self) -> f64 {
        self.mod_left_px + self.left_displaced_head_px
    }
    pub fn total_right_px(&self) -> f64 {
        self.mod_right_px + self.right_displaced_head_px
    }
    /// Extent right of the note's X: the note itself and everything
    /// hanging off its right side.
    pub fn right_extent_px(&self) -> f64 {
        self.note_px + self.right_displaced_head_px + self.mod_right_px
    }
    pub(crate) fn with_shift(mut self, left: f64, right: f64) -> Self {
        self.mod_left_px += left;
        self.mod_right_px += right;
        self
    }
}

/// Any element that consumes musical time and needs horizontal room.
pub trait Tickable {
    fn ticks(&self) -> Ticks;
    fn metrics(&self) -> TickableMetrics;
    fn modifiers(&self) -> &[Modifier] {
        &[]
    }
    fn x(&self) -> f64;
    fn set_x(&mut self, x: f64);
    /// Label grouping notes of equal duration when measuring evenness.
    fn duration_class(&self) -> String {
        self.ticks().to_string()
    }
    /// Center-aligned tickables (whole-measure rests) are drawn at the
    /// middle of the justified span rather than at their column.
    fn is_center_aligned(&self) -> bool {
        false
    }
    /// Offset from the column X to where a center-aligned tickable is
    /// drawn.
    fn center_x_shift(&self) -> f64 {
        0.0
    }
    fn set_center_x_shift(&mut self, _shift: f64) {}
}

/// A tickable with fixed, caller-supplied metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    ticks: Ticks,
    metrics: TickableMetrics,
    modifiers: Vec<Modifier>,
    center_aligned: bool,
    x: f64,
    center_x_shift: f64,
}
impl Note {
    pub fn new(ticks: Ticks, note_px: f64) -> Self {
        Self::with_metrics(ticks, TickableMetrics::new(note_px))
    }
    pub fn with_metrics(ticks: Ticks, metrics: TickableMetrics) -> Self {
        Self {
            ticks,
            metrics,
            modifiers: Vec::new(),
            center_aligned: false,
            x: 0.0,
            center_x_shift: 0.0,
        }
    }
    pub fn add_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
    pub fn center_aligned(mut self, value: bool) -> Self {
        self.center_aligned = value;
        self
    }
}
impl Tickable for Note {
    fn ticks(&self) -> Ticks {
        self.ticks
    }
    fn metrics(&self) -> TickableMetrics {
        self.metrics
    }
    fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
    fn x(&self) -> f64 {
        self.x
    }
    fn set_x(&mut self, x: f64) {
        self.x = x;
    }
    fn is_center_aligned(&self) -> bool {
        self.center_aligned
    }
    fn center_x_shift(&self) -> f64 {
        self.center_x_shift
    }
    fn set_center_x_shift(&mut self, shift: f64) {
        self.center_x_shift = shift;
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, Tickable, TickableMetrics};
    use crate::primitives::{Modifier, ModifierKind, Ticks};

    #[test]
    fn metrics_totals() {
        let metrics = TickableMetrics {
            note_px: 10.0,
            left_displaced_head_px: 2.0,
            right_displaced_head_px: 3.0,
            mod_left_px: 4.0,
            mod_right_px: 5.0,
        };
        assert_eq!(metrics.total_left_px(), 6.0);
        assert_eq!(metrics.total_right_px(), 8.0);
        assert_eq!(metrics.right_extent_px(), 18.0);
        assert_eq!(metrics.with_shift(1.0, 1.0).total_left_px(), 7.0);
    }

    #[test]
    fn note_defaults() {
        let note = Note::new(Ticks::from_note_value(8), 12.0)
            .add_modifier(Modifier::new(ModifierKind::Accidental, 8.0));
        assert_eq!(note.duration_class(), "2048");
        assert_eq!(note.modifiers().len(), 1);
        assert!(!note.is_center_aligned());
    }
}
