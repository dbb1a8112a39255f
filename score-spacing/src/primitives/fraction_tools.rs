//! Tools for treating fractions as exact tick values.

use fraction::Fraction;

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple. `lcm(0, x)` is `x`, so it can seed a fold.
///
/// # Example
///
/// ```
/// # use score_spacing::primitives::lcm;
/// assert_eq!(lcm(4, 6), 12);
/// assert_eq!(lcm(1, 3), 3);
/// assert_eq!(lcm(0, 5), 5);
/// ```
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 {
        return b;
    }
    if b == 0 {
        return a;
    }
    a / gcd(a, b) * b
}

/// Numerator and denominator of a finite, non-negative fraction.
///
/// Returns None for negative, infinite or NaN values.
pub fn fraction_parts(frac: &Fraction) -> Option<(u64, u64)> {
    if frac.is_sign_negative() && *frac.numer()? != 0 {
        return None;
    }
    match (frac.numer(), frac.denom()) {
        (Some(num), Some(den)) if *den != 0 => Some((*num, *den)),
        _ => None,
    }
}

/// Lossy conversion, used only where ticks become pixel weights.
pub fn fraction_to_f64(frac: &Fraction) -> f64 {
    match fraction_parts(frac) {
        Some((num, den)) => num as f64 / den as f64,
        None => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::{fraction_parts, fraction_to_f64, gcd, lcm};

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(lcm(3, 4), 12);
        assert_eq!(lcm(16384, 3), 49152);
        assert_eq!(
            [1_u64, 2, 3, 4].iter().fold(1, |acc, d| lcm(acc, *d)),
            12
        );
    }

    #[test]
    fn test_fraction_parts() {
        assert_eq!(
            fraction_parts(&Fraction::new(6_u64, 8_u64)),
            Some((3, 4))
        );
        assert_eq!(fraction_parts(&Fraction::new(0_u64, 1_u64)), Some((0, 1)));
        assert_eq!(fraction_parts(&Fraction::new(1_u64, 0_u64)), None);
        assert_eq!(fraction_to_f64(&Fraction::new(1_u64, 4_u64)), 0.25);
    }
}
