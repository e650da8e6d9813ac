//! Standard normal distribution (translates `ql/math/distributions/normaldistribution.hpp`).

use cn_core::Real;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// The standard normal probability density function.
///
/// `φ(x) = exp(-x²/2) / √(2π)`
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution function Φ(x).
///
/// Evaluated as `½ erfc(-x/√2)` so that deep tails keep full relative
/// precision, which matters when option prices far out of the money are
/// integrated against a convexity weight.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * statrs::function::erf::erfc(-x * FRAC_1_SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cdf_symmetry_and_centre() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        for &x in &[0.1, 0.5, 1.0, 2.5, 4.0] {
            assert_abs_diff_eq!(normal_cdf(x) + normal_cdf(-x), 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn cdf_known_values() {
        assert_abs_diff_eq!(normal_cdf(1.0), 0.841_344_746_068_543, epsilon = 1e-12);
        assert_abs_diff_eq!(normal_cdf(-1.96), 0.024_997_895_148_220, epsilon = 1e-12);
    }

    #[test]
    fn lower_tail_keeps_relative_precision() {
        // Φ(-10) ≈ 7.62e-24
        let v = normal_cdf(-10.0);
        assert!((v / 7.619_853_024_160_527e-24 - 1.0).abs() < 1e-10, "got {v}");
    }

    #[test]
    fn pdf_peak() {
        assert_abs_diff_eq!(normal_pdf(0.0), 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-15);
    }
}
