use std::{
    fmt::Display,
    ops::{Add, AddAssign, Mul},
};

use fraction::Fraction;

use super::{fraction_parts, fraction_to_f64, lcm};

/// Ticks per whole note.
pub const RESOLUTION: u64 = 16384;

/// Exact, non-negative musical time (position or duration).
///
/// Cross-voice alignment compares scaled tick values for equality,
/// so ticks are never stored as floats.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Ticks {
    fraction: Fraction,
}
impl Ticks {
    /// `den` must not be zero.
    pub fn new(num: u64, den: u64) -> Self {
        Self {
            fraction: Fraction::new(num, den),
        }
    }
    pub fn zero() -> Self {
        Self::new(0, 1)
    }
    /// Ticks of a note value, given as divisions of a whole note
    /// (4 for quarter, 8 for eighth and so on).
    ///
    /// # Example
    /// ```
    /// # use score_spacing::primitives::{Ticks, RESOLUTION};
    /// assert_eq!(Ticks::from_note_value(4), Ticks::from(RESOLUTION / 4));
    /// assert_eq!(Ticks::from_note_value(4).dotted(), Ticks::from(6144));
    /// ```
    pub fn from_note_value(divisions: u64) -> Self {
        Self::new(RESOLUTION, divisions)
    }
    /// Scale by `num/den`, e.g. `2/3` for a triplet member.
    pub fn scaled(&self, num: u64, den: u64) -> Self {
        Self {
            fraction: self.fraction * Fraction::new(num, den),
        }
    }
    pub fn dotted(&self) -> Self {
        self.scaled(3, 2)
    }
    pub fn get(&self) -> Fraction {
        self.fraction
    }
    /// Reduced numerator; zero for non-finite values.
    pub fn numer(&self) -> u64 {
        fraction_parts(&self.fraction).map_or(0, |(num, _)| num)
    }
    /// Reduced denominator; zero for non-finite values.
    pub fn denom(&self) -> u64 {
        fraction_parts(&self.fraction).map_or(0, |(_, den)| den)
    }
    pub fn is_zero(&self) -> bool {
        self.numer() == 0
    }
    /// Finite and not negative.
    pub fn is_valid(&self) -> bool {
        fraction_parts(&self.fraction).is_some()
    }
    pub fn as_f64(&self) -> f64 {
        fraction_to_f64(&self.fraction)
    }
    /// Express the value on an integer timeline of `multiplier`
    /// subdivisions per tick.
    ///
    /// Returns None if the denominator does not divide the multiplier.
    ///
    /// # Example
    /// ```
    /// # use score_spacing::primitives::Ticks;
    /// let third = Ticks::new(1, 3);
    /// assert_eq!(third.scaled_to(6), Some(2));
    /// assert_eq!(third.scaled_to(4), None);
    /// ```
    pub fn scaled_to(&self, multiplier: u64) -> Option<u64> {
        let (num, den) = fraction_parts(&self.fraction)?;
        match multiplier % den {
            0 => Some(num * (multiplier / den)),
            _ => None,
        }
    }
    /// Multiplier needed to make both values integral.
    pub fn resolution_with(&self, multiplier: u64) -> u64 {
        lcm(multiplier, self.denom().max(1))
    }
    pub fn checked_sub(&self, rhs: Self) -> Option<Self> {
        if rhs.fraction > self.fraction {
            return None;
        }
        Some(Self::from(self.fraction - rhs.fraction))
    }
}
impl Default for Ticks {
    fn default() -> Self {
        Self::zero()
    }
}
impl From<Fraction> for Ticks {
    fn from(value: Fraction) -> Self {
        Self { fraction: value }
    }
}
impl From<u64> for Ticks {
    fn from(value: u64) -> Self {
        Self::new(value, 1)
    }
}
impl Add for Ticks {
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            fraction: self.fraction + rhs.fraction,
        }
    }
    type Output = Self;
}
impl AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.fraction = self.fraction + rhs.fraction;
    }
}
impl Mul<u64> for Ticks {
    fn mul(self, rhs: u64) -> Self::Output {
        self.scaled(rhs, 1)
    }
    type Output = Self;
}
impl Display for Ticks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::{Ticks, RESOLUTION};

    #[test]
    fn ticks() {
        let quarter = Ticks::from_note_value(4);
        assert_eq!(quarter, Ticks::from(4096));
        assert_eq!(quarter + quarter, Ticks::from_note_value(2));
        assert_eq!(quarter * 4, Ticks::from(RESOLUTION));
        assert_eq!(quarter.to_string(), "4096");
        assert_eq!(Ticks::new(2, 4).to_string(), "1/2");
        assert_eq!(Ticks::new(2, 4).denom(), 2);
    }

    #[test]
    fn triplets_stay_exact() {
        let eighth_triplet = Ticks::from_note_value(8).scaled(2, 3);
        assert_eq!(eighth_triplet.denom(), 3);
        let mut sum = Ticks::zero();
        for _ in 0..3 {
            sum += eighth_triplet;
        }
        assert_eq!(sum, Ticks::from_note_value(4));
        assert_eq!(sum.scaled_to(3), Some(4096 * 3));
        assert_eq!(eighth_triplet.resolution_with(1), 3);
    }

    #[test]
    fn checked_sub() {
        let half = Ticks::from_note_value(2);
        let quarter = Ticks::from_note_value(4);
        assert_eq!(half.checked_sub(quarter), Some(quarter));
        assert_eq!(quarter.checked_sub(half), None);
    }
}
