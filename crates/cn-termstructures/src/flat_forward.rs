//! `FlatForward` — a yield term structure with a constant forward rate
//! (translates `ql/termstructures/yield/flatforward.hpp`).
//!
//! This is the simplest possible yield curve: a constant continuously-compounded
//! rate that applies for all maturities.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use cn_core::{DiscountFactor, Rate, Time};

/// A flat (constant) forward-rate yield term structure.
///
/// Discount factors are computed as `P(t) = exp(-r * t)`.
///
/// Corresponds to `QuantLib::FlatForward`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatForward {
    /// The continuously-compounded flat rate.
    rate: Rate,
}

impl FlatForward {
    /// Create a flat-forward curve from a continuously-compounded rate.
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// Create a flat-forward curve from a rate compounded `frequency` times
    /// a year.
    pub fn compounded(rate: Rate, frequency: u32) -> Self {
        let f = Rate::from(frequency.max(1));
        Self::new(f * (1.0 + rate / f).ln())
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl TermStructure for FlatForward {}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn flat_forward_discount() {
        let curve = FlatForward::new(0.05);

        assert_abs_diff_eq!(curve.discount(0.0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(1.0), (-0.05_f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(curve.discount(10.0), (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn flat_forward_rates_are_constant() {
        let curve = FlatForward::new(0.03);

        assert_abs_diff_eq!(curve.zero_rate(0.5), 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.instantaneous_forward(3.0), 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.forward_rate(1.0, 7.0), 0.03, epsilon = 1e-14);
    }

    #[test]
    fn flat_forward_with_annual_compounding() {
        // annual 5% -> continuous ln(1.05)
        let curve = FlatForward::compounded(0.05, 1);
        assert_abs_diff_eq!(curve.rate(), 1.05_f64.ln(), epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(2.0), 1.0 / (1.05 * 1.05), epsilon = 1e-15);
    }

    #[test]
    fn semiannual_compounding() {
        let curve = FlatForward::compounded(0.04, 2);
        assert_abs_diff_eq!(curve.discount(1.0), 1.0 / (1.02 * 1.02), epsilon = 1e-15);
    }
}
