//! `ConvexMonotoneForwardCurve` — Hagan-West yield curve built on the
//! convex-monotone forward interpolant.
//!
//! The curve is specified by average forwards over consecutive periods:
//! `forwards[i]` is the average instantaneous forward over
//! `(times[i-1], times[i]]`. The instantaneous forward is the convex-monotone
//! interpolant and `P(t) = exp(-∫₀ᵗ f(s) ds)` is exact, so every pillar
//! reprices `P(times[i]) = exp(-Σ forwards[j]·Δt_j)`.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use cn_core::{errors::Result, DiscountFactor, Rate, Real, Time};
use cn_math::interpolations::{ConvexMonotone, SectionMap};

/// A yield curve whose instantaneous forward is the Hagan-West
/// convex-monotone interpolant of period-average forwards.
#[derive(Debug, Clone)]
pub struct ConvexMonotoneForwardCurve {
    times: Vec<Time>,
    forwards: Vec<Rate>,
    settings: ConvexMonotone,
    sections: SectionMap,
}

impl ConvexMonotoneForwardCurve {
    /// Build the curve from pillar times starting at 0 and period-average
    /// forwards (`forwards[0]` is ignored).
    ///
    /// # Errors
    /// Precondition failures for mismatched sizes, a first time other than
    /// 0 or times that are not strictly increasing, plus the interpolation
    /// errors of [`SectionMap::build`].
    pub fn new(times: Vec<Time>, forwards: Vec<Rate>, settings: ConvexMonotone) -> Result<Self> {
        cn_core::ensure!(
            times.first() == Some(&0.0),
            "the first pillar time must be 0"
        );
        cn_core::ensure!(
            times.windows(2).all(|w| w[1] > w[0]),
            "pillar times must be strictly increasing"
        );
        let sections = SectionMap::build(&times, &forwards, settings, false, Vec::new())?;
        Ok(Self {
            times,
            forwards,
            settings,
            sections,
        })
    }

    /// Build the curve from discount factors at the pillars
    /// (`discounts[0]` must be 1).
    pub fn from_discounts(
        times: Vec<Time>,
        discounts: &[DiscountFactor],
        settings: ConvexMonotone,
    ) -> Result<Self> {
        cn_core::ensure!(
            times.len() == discounts.len(),
            "times and discounts must have the same length ({} vs {})",
            times.len(),
            discounts.len()
        );
        cn_core::ensure!(
            discounts.iter().all(|&d| d > 0.0),
            "discount factors must be positive"
        );
        let mut forwards = vec![0.0; times.len()];
        for i in 1..times.len() {
            forwards[i] = (discounts[i - 1] / discounts[i]).ln() / (times[i] - times[i - 1]);
        }
        if forwards.len() > 1 {
            forwards[0] = forwards[1];
        }
        Self::new(times, forwards, settings)
    }

    /// Pillar times.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Period-average forwards.
    pub fn forwards(&self) -> &[Rate] {
        &self.forwards
    }

    /// Interpolation settings.
    pub fn settings(&self) -> ConvexMonotone {
        self.settings
    }

    /// Integral of the instantaneous forward from 0 to `t`.
    pub fn integrated_forward(&self, t: Time) -> Real {
        self.sections.primitive(t)
    }
}

impl TermStructure for ConvexMonotoneForwardCurve {}

impl YieldTermStructure for ConvexMonotoneForwardCurve {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t <= 0.0 {
            return 1.0;
        }
        (-self.sections.primitive(t)).exp()
    }

    fn zero_rate_impl(&self, t: Time) -> Rate {
        if t <= 0.0 {
            return self.forward_rate_impl(0.0);
        }
        self.sections.primitive(t) / t
    }

    fn forward_rate_impl(&self, t: Time) -> Rate {
        self.sections.value(t.max(0.0))
    }
}
