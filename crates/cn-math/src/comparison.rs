//! Floating-point comparison (translates `ql/math/comparison.hpp`).

use cn_core::Real;

/// Default multiple of machine epsilon used by [`close`] and [`close_enough`].
pub const DEFAULT_TOLERANCE_MULTIPLE: u32 = 42;

/// `true` when `x` and `y` agree within `42 ε` relative to *both* values.
///
/// When either value is zero the test becomes `|x - y| < (42 ε)²`.
#[inline]
pub fn close(x: Real, y: Real) -> bool {
    close_n(x, y, DEFAULT_TOLERANCE_MULTIPLE)
}

/// [`close`] with an explicit multiple of machine epsilon.
pub fn close_n(x: Real, y: Real, n: u32) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = Real::from(n) * Real::EPSILON;
    if x * y == 0.0 {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() && diff <= tolerance * y.abs()
}

/// `true` when `x` and `y` agree within `42 ε` relative to *either* value.
#[inline]
pub fn close_enough(x: Real, y: Real) -> bool {
    close_enough_n(x, y, DEFAULT_TOLERANCE_MULTIPLE)
}

/// [`close_enough`] with an explicit multiple of machine epsilon.
pub fn close_enough_n(x: Real, y: Real, n: u32) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = Real::from(n) * Real::EPSILON;
    if x * y == 0.0 {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() || diff <= tolerance * y.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_basic() {
        assert!(close(1.0, 1.0 + 10.0 * Real::EPSILON));
        assert!(!close(1.0, 1.0 + 1e-12));
        assert!(close(0.0, 1e-30));
        assert!(!close(0.0, 1e-20));
    }

    #[test]
    fn close_enough_basic() {
        assert!(close_enough(1.0, 1.0 - 41.5 * Real::EPSILON));
        assert!(!close_enough(1.0, 1.0 + 1e-12));
        assert!(close_enough_n(1.0, 1.0 + 3.0 * Real::EPSILON, 4));
        assert!(!close_enough_n(1.0, 1.0 + 8.0 * Real::EPSILON, 4));
    }
}
