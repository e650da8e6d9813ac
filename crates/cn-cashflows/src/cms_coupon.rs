//! Constant-maturity-swap coupons (translates `ql/cashflows/cmscoupon.hpp`).
//!
//! A CMS coupon pays `gearing * R + spread` over its accrual period, where
//! `R` is the fair rate of a swap observed at the fixing time. Everything is
//! measured in years from the evaluation date: a fixing time `<= 0` means the
//! rate has already been observed, a payment time `<= 0` means the coupon
//! has already been paid.

use std::sync::Arc;

use cn_core::{
    errors::{Error, Result},
    DiscountFactor, Rate, Real, Spread, Time,
};
use cn_termstructures::YieldTermStructure;

use crate::hagan_pricer::HaganPricer;

// ────────────────────────────────────────────────────────────────────────────
// SwapSchedule
// ────────────────────────────────────────────────────────────────────────────

/// Fixed-leg schedule of the swap underlying a CMS coupon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapSchedule {
    start_time: Time,
    payment_times: Vec<Time>,
    accruals: Vec<Real>,
    frequency: u32,
    tenor: Time,
}

impl SwapSchedule {
    /// Create a schedule from explicit fixed-leg payment times and accrual
    /// fractions.
    ///
    /// `frequency` is the number of fixed payments per year and `tenor` the
    /// swap length in years; both feed the standard yield-curve model.
    pub fn new(
        start_time: Time,
        payment_times: Vec<Time>,
        accruals: Vec<Real>,
        frequency: u32,
        tenor: Time,
    ) -> Result<Self> {
        if payment_times.is_empty() {
            return Err(Error::InsufficientData {
                what: "swap fixed leg".into(),
                required: 1,
                given: 0,
            });
        }
        cn_core::ensure!(
            payment_times.len() == accruals.len(),
            "payment times ({}) and accruals ({}) differ in size",
            payment_times.len(),
            accruals.len()
        );
        cn_core::ensure!(frequency > 0, "fixed-leg frequency must be positive");
        cn_core::ensure!(tenor > 0.0, "swap tenor ({tenor}) must be positive");
        let mut previous = start_time;
        for &t in &payment_times {
            cn_core::ensure!(
                t > previous,
                "payment times must follow the swap start and increase ({t} after {previous})"
            );
            previous = t;
        }
        Ok(Self {
            start_time,
            payment_times,
            accruals,
            frequency,
            tenor,
        })
    }

    /// A regular schedule of `tenor * frequency` periods of length
    /// `1 / frequency` starting at `start_time`. The tenor must be a
    /// positive multiple of the period length.
    pub fn regular(start_time: Time, tenor: Time, frequency: u32) -> Result<Self> {
        cn_core::ensure!(frequency > 0, "fixed-leg frequency must be positive");
        let accrual = 1.0 / Real::from(frequency);
        let exact_periods = tenor * Real::from(frequency);
        cn_core::ensure!(
            exact_periods >= 0.5 && (exact_periods - exact_periods.round()).abs() < 1.0e-9,
            "swap tenor ({tenor}) must span a positive whole number of periods at frequency {frequency}"
        );
        let periods = exact_periods.round() as usize;
        let payment_times = (1..=periods)
            .map(|i| start_time + accrual * i as Real)
            .collect();
        Self::new(start_time, payment_times, vec![accrual; periods], frequency, tenor)
    }

    /// Start of the first fixed-leg accrual period.
    pub fn start_time(&self) -> Time {
        self.start_time
    }

    /// Fixed-leg payment times.
    pub fn payment_times(&self) -> &[Time] {
        &self.payment_times
    }

    /// Fixed-leg accrual fractions.
    pub fn accruals(&self) -> &[Real] {
        &self.accruals
    }

    /// Number of fixed payments per year.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Swap length in years.
    pub fn tenor(&self) -> Time {
        self.tenor
    }

    /// First fixed-leg payment time.
    pub fn first_payment_time(&self) -> Time {
        self.payment_times[0]
    }

    /// Last fixed-leg payment time (the swap maturity).
    pub fn maturity(&self) -> Time {
        self.payment_times[self.payment_times.len() - 1]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CmsCoupon
// ────────────────────────────────────────────────────────────────────────────

/// A coupon paying a swap rate observed at `fixing_time`.
///
/// Corresponds to `QuantLib::CmsCoupon`, with the swap index replaced by the
/// fixed-leg [`SwapSchedule`] and the curve it is projected on.
#[derive(Debug, Clone)]
pub struct CmsCoupon {
    payment_time: Time,
    accrual_period: Real,
    fixing_time: Time,
    gearing: Real,
    spread: Spread,
    fixing: Option<Rate>,
    swap: SwapSchedule,
    curve: Arc<dyn YieldTermStructure>,
}

impl CmsCoupon {
    /// Create a coupon with unit gearing and no spread.
    pub fn new(
        curve: Arc<dyn YieldTermStructure>,
        swap: SwapSchedule,
        fixing_time: Time,
        payment_time: Time,
        accrual_period: Real,
    ) -> Self {
        Self {
            payment_time,
            accrual_period,
            fixing_time,
            gearing: 1.0,
            spread: 0.0,
            fixing: None,
            swap,
            curve,
        }
    }

    /// Set the multiplicative gearing.
    pub fn with_gearing(mut self, gearing: Real) -> Self {
        self.gearing = gearing;
        self
    }

    /// Set the additive spread.
    pub fn with_spread(mut self, spread: Spread) -> Self {
        self.spread = spread;
        self
    }

    /// Set the realised swap rate, used once the fixing time has passed.
    pub fn with_fixing(mut self, fixing: Rate) -> Self {
        self.fixing = Some(fixing);
        self
    }

    /// Payment time.
    pub fn payment_time(&self) -> Time {
        self.payment_time
    }

    /// Accrual period as a year fraction.
    pub fn accrual_period(&self) -> Real {
        self.accrual_period
    }

    /// Fixing time of the swap rate.
    pub fn fixing_time(&self) -> Time {
        self.fixing_time
    }

    /// Gearing.
    pub fn gearing(&self) -> Real {
        self.gearing
    }

    /// Spread.
    pub fn spread(&self) -> Spread {
        self.spread
    }

    /// Whether the swap rate has already been observed.
    pub fn is_fixed(&self) -> bool {
        self.fixing_time <= 0.0
    }

    /// The underlying swap's fixed-leg schedule.
    pub fn swap(&self) -> &SwapSchedule {
        &self.swap
    }

    /// The curve the swap rate and discount factors are read from.
    pub fn curve(&self) -> &Arc<dyn YieldTermStructure> {
        &self.curve
    }

    /// Discount factor to the payment time; 1 once the coupon is paid.
    pub fn payment_discount(&self) -> DiscountFactor {
        if self.payment_time > 0.0 {
            self.curve.discount(self.payment_time)
        } else {
            1.0
        }
    }

    /// Fixed-leg annuity `Σ τ_i P(t_i)` of the underlying swap.
    pub fn annuity(&self) -> Real {
        self.swap
            .accruals
            .iter()
            .zip(&self.swap.payment_times)
            .map(|(tau, &t)| tau * self.curve.discount(t))
            .sum::<Real>()
            .abs()
    }

    /// Fair rate `(P(t_s) - P(t_n)) / annuity` of the underlying swap.
    pub fn swap_rate(&self) -> Result<Rate> {
        let annuity = self.annuity();
        if annuity == 0.0 {
            return Err(Error::Runtime("null swap annuity".into()));
        }
        let floating_leg =
            self.curve.discount(self.swap.start_time) - self.curve.discount(self.swap.maturity());
        Ok(floating_leg / annuity)
    }

    /// The swap rate paid by the coupon: the realised fixing once the fixing
    /// time has passed, the forward swap rate otherwise.
    pub fn index_fixing(&self) -> Result<Rate> {
        if self.is_fixed() {
            self.fixing.ok_or_else(|| {
                Error::NullValue(format!(
                    "missing swap-rate fixing for fixing time {}",
                    self.fixing_time
                ))
            })
        } else {
            self.swap_rate()
        }
    }

    /// Ratio between the time from swap start to payment and the length of
    /// the first fixed-leg period.
    pub fn payment_delay_ratio(&self) -> Real {
        (self.payment_time - self.swap.start_time)
            / (self.swap.first_payment_time() - self.swap.start_time)
    }

    /// Convexity-adjusted coupon rate, `gearing * E[R] + spread`, as given
    /// by `pricer`.
    pub fn rate(&self, pricer: &mut dyn HaganPricer) -> Result<Rate> {
        pricer.initialize(self)?;
        pricer.swaplet_rate()
    }
}
