//! Voice is an ordered run of tickables with a duration budget.
//!
//! All voices formatted together must share the same budget. How strictly
//! a voice must fill it depends on its [VoiceMode].
//!
//! # Example
//! ```
//! use score_spacing::primitives::{Note, Ticks, Voice, VoiceMode, VoiceTime};
//! let mut voice = Voice::new(VoiceTime::default());
//! voice
//!     .add_tickable(Note::new(Ticks::from_note_value(2), 10.0))
//!     .unwrap()
//!     .add_tickable(Note::new(Ticks::from_note_value(2), 10.0))
//!     .unwrap();
//! assert!(voice.is_complete());
//! assert!(voice
//!     .add_tickable(Note::new(Ticks::from_note_value(4), 10.0))
//!     .is_err());
//! assert_eq!(voice.len(), 2);
//! ```

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, FormatResult};

use super::{ModifierShift, Tickable, TickableMetrics, Ticks, RESOLUTION};

pub const DEFAULT_SOFTMAX_FACTOR: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceMode {
    /// Ticks used must equal the budget exactly.
    #[default]
    Strict,
    /// Anything goes; used by helpers that lay out loose notes.
    Soft,
    /// May be underfilled, never overfilled.
    Full,
}

/// Time signature of a voice, expressed against a tick resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceTime {
    pub num_beats: u32,
    pub beat_value: u32,
    pub resolution: u64,
}
impl VoiceTime {
    pub fn new(num_beats: u32, beat_value: u32) -> Self {
        Self {
            num_beats,
            beat_value,
            resolution: RESOLUTION,
        }
    }
    pub fn total_ticks(&self) -> Ticks {
        Ticks::new(
            self.num_beats as u64 * self.resolution,
            self.beat_value.max(1) as u64,
        )
    }
}
impl Default for VoiceTime {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Voice {
    time: VoiceTime,
    total_ticks: Ticks,
    ticks_used: Ticks,
    mode: VoiceMode,
    softmax_factor: f64,
    /// LCM of the tick denominators of all tickables.
    resolution_multiplier: u64,
    #[derivative(Debug = "ignore")]
    tickables: Vec<Box<dyn Tickable>>,
    modifier_shifts: Vec<ModifierShift>,
}
impl Voice {
    pub fn new(time: VoiceTime) -> Self {
        Self {
            time,
            total_ticks: time.total_ticks(),
            ticks_used: Ticks::zero(),
            mode: VoiceMode::default(),
            softmax_factor: DEFAULT_SOFTMAX_FACTOR,
            resolution_multiplier: 1,
            tickables: Vec::new(),
            modifier_shifts: Vec::new(),
        }
    }
    pub fn with_mode(mut self, mode: VoiceMode) -> Self {
        self.mode = mode;
        self
    }
    pub fn set_mode(&mut self, mode: VoiceMode) -> &mut Self {
        self.mode = mode;
        self
    }
    pub fn mode(&self) -> VoiceMode {
        self.mode
    }
    pub fn time(&self) -> &VoiceTime {
        &self.time
    }
    pub fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }
    pub fn ticks_used(&self) -> Ticks {
        self.ticks_used
    }
    pub fn resolution_multiplier(&self) -> u64 {
        self.resolution_multiplier
    }
    pub fn softmax_factor(&self) -> f64 {
        self.softmax_factor
    }
    /// Higher factors give longer notes proportionally more room.
    pub fn set_softmax_factor(
        &mut self,
        factor: f64,
    ) -> FormatResult<&mut Self> {
        if !factor.is_finite() || factor < 1.0 {
            return Err(FormatError::InvalidOption(format!(
                "softmax factor should be finite and >= 1, got {}",
                factor
            )));
        }
        self.softmax_factor = factor;
        Ok(self)
    }

    pub fn is_complete(&self) -> bool {
        match self.mode {
            VoiceMode::Strict | VoiceMode::Full => {
                self.ticks_used == self.total_ticks
            }
            VoiceMode::Soft => true,
        }
    }

    /// Append a tickable.
    ///
    /// # Errors
    /// - BadArgument if the tickable consumes zero or non-finite ticks.
    /// - TooManyTicks if a Strict or Full voice would exceed its budget.
    ///   The voice stays unchanged.
    pub fn add_tickable(
        &mut self,
        tickable: impl Tickable + 'static,
    ) -> FormatResult<&mut Self> {
        self.add_boxed(Box::new(tickable))
    }
    pub fn add_boxed(
        &mut self,
        tickable: Box<dyn Tickable>,
    ) -> FormatResult<&mut Self> {
        let ticks = tickable.ticks();
        if !ticks.is_valid() || ticks.is_zero() {
            return Err(FormatError::BadArgument(format!(
                "tickable should consume a positive tick count, got {}",
                ticks
            )));
        }
        let used = self.ticks_used + ticks;
        if self.mode != VoiceMode::Soft && used > self.total_ticks {
            return Err(FormatError::TooManyTicks {
                used,
                total: self.total_ticks,
            });
        }
        self.ticks_used = used;
        self.resolution_multiplier =
            ticks.resolution_with(self.resolution_multiplier);
        self.tickables.push(tickable);
        self.modifier_shifts.push(ModifierShift::default());
        Ok(self)
    }
    pub fn add_tickables<T: Tickable + 'static>(
        &mut self,
        tickables: impl IntoIterator<Item = T>,
    ) -> FormatResult<&mut Self> {
        for tickable in tickables {
            self.add_tickable(tickable)?;
        }
        Ok(self)
    }

    pub fn tickables(&self) -> &[Box<dyn Tickable>] {
        &self.tickables
    }
    pub fn tickables_mut(&mut self) -> &mut [Box<dyn Tickable>] {
        &mut self.tickables
    }
    pub fn len(&self) -> usize {
        self.tickables.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tickables.is_empty()
    }

    /// Metrics of the tickable at `index`, widened by the shift of the
    /// ModifierContext it was joined into.
    pub fn effective_metrics(&self, index: usize) -> Option<TickableMetrics> {
        let shift = self.modifier_shifts.get(index)?;
        let tickable = self.tickables.get(index)?;
        Some(tickable.metrics().with_shift(shift.left, shift.right))
    }
    pub fn modifier_shift(&self, index: usize) -> Option<ModifierShift> {
        self.modifier_shifts.get(index).copied()
    }
    pub(crate) fn set_modifier_shift(
        &mut self,
        index: usize,
        shift: ModifierShift,
    ) {
        if let Some(slot) = self.modifier_shifts.get_mut(index) {
            *slot = shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::FormatError,
        primitives::{Note, Ticks, TickableMetrics},
    };

    use super::{Voice, VoiceMode, VoiceTime};

    fn quarter() -> Note {
        Note::new(Ticks::from_note_value(4), 10.0)
    }

    #[test]
    fn strict_voice_rejects_overflow() {
        let mut voice = Voice::new(VoiceTime::new(2, 4));
        voice.add_tickables([quarter(), quarter()]).unwrap();
        assert!(voice.is_complete());
        let err = voice.add_tickable(quarter()).unwrap_err();
        assert_eq!(
            err,
            FormatError::TooManyTicks {
                used: Ticks::from_note_value(4) * 3,
                total: Ticks::from_note_value(2),
            }
        );
        assert_eq!(voice.len(), 2);
        assert_eq!(voice.ticks_used(), Ticks::from_note_value(2));
    }

    #[test]
    fn modes() {
        let mut soft =
            Voice::new(VoiceTime::new(1, 4)).with_mode(VoiceMode::Soft);
        soft.add_tickables([quarter(), quarter()]).unwrap();
        assert!(soft.is_complete());

        let mut full =
            Voice::new(VoiceTime::new(2, 4)).with_mode(VoiceMode::Full);
        full.add_tickable(quarter()).unwrap();
        assert!(!full.is_complete());
        full.add_tickable(quarter()).unwrap();
        assert!(full.add_tickable(quarter()).is_err());
    }

    #[test]
    fn zero_ticks_rejected() {
        let mut voice = Voice::new(VoiceTime::default());
        assert!(matches!(
            voice.add_tickable(Note::new(Ticks::zero(), 10.0)),
            Err(FormatError::BadArgument(_))
        ));
    }

    #[test]
    fn resolution_multiplier_tracks_tuplets() {
        let mut voice = Voice::new(VoiceTime::new(1, 4));
        let triplet = Ticks::from_note_value(8).scaled(2, 3);
        voice
            .add_tickables((0..3).map(|_| Note::new(triplet, 10.0)))
            .unwrap();
        assert_eq!(voice.resolution_multiplier(), 3);
        assert!(voice.is_complete());
    }

    #[test]
    fn softmax_factor_validated() {
        let mut voice = Voice::new(VoiceTime::default());
        assert!(voice.set_softmax_factor(0.5).is_err());
        assert!(voice.set_softmax_factor(f64::NAN).is_err());
        voice.set_softmax_factor(5.0).unwrap();
        assert_eq!(voice.softmax_factor(), 5.0);
    }

    #[test]
    fn effective_metrics_include_shift() {
        let mut voice = Voice::new(VoiceTime::new(1, 4));
        voice.add_tickable(quarter()).unwrap();
        assert_eq!(
            voice.effective_metrics(0),
            Some(TickableMetrics::new(10.0))
        );
        voice.set_modifier_shift(
            0,
            crate::primitives::ModifierShift {
                left: 3.0,
                right: 2.0,
            },
        );
        let metrics = voice.effective_metrics(0).unwrap();
        assert_eq!(metrics.total_left_px(), 3.0);
        assert_eq!(metrics.total_right_px(), 2.0);
        assert_eq!(voice.effective_metrics(1), None);
    }
}
