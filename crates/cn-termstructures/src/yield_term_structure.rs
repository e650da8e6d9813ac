//! `YieldTermStructure` — yield / interest-rate term structures
//! (translates `ql/termstructures/yieldtermstructure.hpp`).
//!
//! This module defines the `YieldTermStructure` trait together with the three
//! quantities any yield curve must provide, all continuously compounded and
//! indexed by time:
//!
//! * **discount factor** — `P(0,t)`
//! * **zero rate** — `-ln P(0,t) / t`
//! * **instantaneous forward** — `-d ln P(0,t) / dt`

use crate::term_structure::TermStructure;
use cn_core::{DiscountFactor, Rate, Real, Time};

/// Small time step used for instantaneous forward rate computations.
const DT: Real = 1.0e-4;

/// A yield (interest-rate) term structure.
///
/// Implementors must provide **at least one** of the three low-level methods:
///
/// * [`discount_impl`](YieldTermStructure::discount_impl)
/// * [`zero_rate_impl`](YieldTermStructure::zero_rate_impl)
/// * [`forward_rate_impl`](YieldTermStructure::forward_rate_impl)
///
/// Default implementations of the others follow from the relationships that
/// connect them. Overriding none of them recurses forever.
///
/// Corresponds to `QuantLib::YieldTermStructure`.
pub trait YieldTermStructure: TermStructure {
    // ── Low-level impl hooks ─────────────────────────────────────────────

    /// Return the discount factor for time `t`.
    ///
    /// Default: computed from `zero_rate_impl`.
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        (-self.zero_rate_impl(t) * t).exp()
    }

    /// Return the continuously-compounded zero rate for time `t`.
    ///
    /// Default: computed from `discount_impl`; at `t = 0` the instantaneous
    /// forward is used as the limit.
    fn zero_rate_impl(&self, t: Time) -> Rate {
        if t == 0.0 {
            return self.forward_rate_impl(0.0);
        }
        -self.discount_impl(t).ln() / t
    }

    /// Return the instantaneous forward rate at time `t`.
    ///
    /// Default: central difference of `ln P` (one-sided at `t = 0`).
    fn forward_rate_impl(&self, t: Time) -> Rate {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        (self.discount_impl(t1).ln() - self.discount_impl(t2).ln()) / (t2 - t1)
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        self.discount_impl(t)
    }

    /// Continuously-compounded zero rate for a time.
    fn zero_rate(&self, t: Time) -> Rate {
        self.zero_rate_impl(t)
    }

    /// Instantaneous forward rate at `t`.
    fn instantaneous_forward(&self, t: Time) -> Rate {
        self.forward_rate_impl(t)
    }

    /// Continuously-compounded forward rate between `t1` and `t2`; the
    /// instantaneous forward when the times coincide.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        if t1 == t2 {
            return self.forward_rate_impl(t1);
        }
        (self.discount_impl(t1) / self.discount_impl(t2)).ln() / (t2 - t1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Curve defined only through its zero rates.
    #[derive(Debug)]
    struct LinearZero;

    impl TermStructure for LinearZero {}

    impl YieldTermStructure for LinearZero {
        fn zero_rate_impl(&self, t: Time) -> Rate {
            0.02 + 0.001 * t
        }
    }

    #[test]
    fn defaults_follow_from_zero_rates() {
        let curve = LinearZero;
        assert_abs_diff_eq!(curve.discount(0.0), 1.0);
        assert_abs_diff_eq!(curve.discount(5.0), (-0.025_f64 * 5.0).exp(), epsilon = 1e-15);
        // f(t) = d(t·z(t))/dt = 0.02 + 0.002 t
        assert_abs_diff_eq!(curve.instantaneous_forward(3.0), 0.026, epsilon = 1e-8);
        assert_abs_diff_eq!(
            curve.forward_rate(2.0, 4.0),
            (4.0 * 0.024 - 2.0 * 0.022) / 2.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn coincident_times_give_instantaneous_forward() {
        let curve = LinearZero;
        assert_eq!(curve.forward_rate(1.5, 1.5), curve.instantaneous_forward(1.5));
    }
}
