//! Yield-curve models for the Hagan CMS pricers (translates the
//! `GFunctionFactory` part of `ql/cashflows/conundrumpricer.hpp`).
//!
//! A CMS coupon pays the swap rate `R_s` at a time that is not the natural
//! payment time of the swap. Hagan's replication approximates the ratio
//! between the payment-time discount factor and the swap annuity by a
//! function `G(R_s)` of the swap rate alone. The models below differ in how
//! the yield curve is assumed to move with `R_s`:
//!
//! - [`GFunctionStandard`]: flat curve, regular fixed-leg periods
//!   (Hagan 2.13a).
//! - [`GFunctionExactYield`]: flat curve, actual fixed-leg accruals.
//! - [`GFunctionWithShifts`]: the current curve shifted by `x·h(t)`, with
//!   `h` parallel or mean-reverting, and `x` calibrated for every `R_s` by a
//!   Newton search.

use std::cell::Cell;
use std::fmt;

use cn_core::{
    errors::{Error, Result},
    DiscountFactor, Rate, Real, Time,
};
use cn_math::solvers1d::Newton;

use crate::cms_coupon::CmsCoupon;

/// Value and first two derivatives of a yield-curve model's `G` function.
pub trait GFunction: fmt::Debug {
    /// `G(x)`.
    fn value(&self, x: Real) -> Result<Real>;

    /// `G'(x)`.
    fn first_derivative(&self, x: Real) -> Result<Real>;

    /// `G''(x)`.
    fn second_derivative(&self, x: Real) -> Result<Real>;
}

/// Yield-curve model used to build the `G` function of a CMS coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum YieldCurveModel {
    /// Flat curve with regular fixed-leg periods; see [`GFunctionStandard`].
    Standard,
    /// Flat curve with the actual fixed-leg accruals; see
    /// [`GFunctionExactYield`].
    ExactYield,
    /// Parallel shifts of the current curve (zero mean reversion).
    ParallelShifts,
    /// Mean-reverting shifts of the current curve.
    NonParallelShifts,
}

/// Build the `G` function of `coupon` under `model`.
///
/// `mean_reversion` only matters for [`YieldCurveModel::NonParallelShifts`].
pub fn g_function(
    model: YieldCurveModel,
    coupon: &CmsCoupon,
    mean_reversion: Real,
) -> Result<Box<dyn GFunction>> {
    Ok(match model {
        YieldCurveModel::Standard => {
            let swap = coupon.swap();
            Box::new(GFunctionStandard::new(
                swap.frequency(),
                coupon.payment_delay_ratio(),
                swap.tenor(),
            )?)
        }
        YieldCurveModel::ExactYield => Box::new(GFunctionExactYield::from_coupon(coupon)?),
        YieldCurveModel::ParallelShifts => Box::new(GFunctionWithShifts::new(coupon, 0.0)?),
        YieldCurveModel::NonParallelShifts => {
            Box::new(GFunctionWithShifts::new(coupon, mean_reversion)?)
        }
    })
}

// ── Standard ──────────────────────────────────────────────────────────────────

/// `G(x) = x / (1 + x/q)^δ / (1 - (1 + x/q)^(-n))` with `n = q·L`.
///
/// `q` is the fixed-leg frequency, `L` the swap length in years and `δ` the
/// payment delay measured in fixed-leg periods.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GFunctionStandard {
    q: Real,
    delta: Real,
    swap_length: Time,
}

impl GFunctionStandard {
    /// Create the function for `frequency` fixed payments per year.
    pub fn new(frequency: u32, delta: Real, swap_length: Time) -> Result<Self> {
        cn_core::ensure!(frequency > 0, "fixed-leg frequency must be positive");
        cn_core::ensure!(
            swap_length > 0.0,
            "swap length ({swap_length}) must be positive"
        );
        Ok(Self {
            q: Real::from(frequency),
            delta,
            swap_length,
        })
    }

    fn periods(&self) -> Real {
        self.swap_length * self.q
    }
}

impl GFunction for GFunctionStandard {
    fn value(&self, x: Real) -> Result<Real> {
        let n = self.periods();
        let a = 1.0 + x / self.q;
        Ok(x / a.powf(self.delta) / (1.0 - 1.0 / a.powf(n)))
    }

    fn first_derivative(&self, x: Real) -> Result<Real> {
        let (q, delta, n) = (self.q, self.delta, self.periods());
        let a = 1.0 + x / q;
        let an1 = a.powf(n) - 1.0;
        let aa = a - delta / q * x;
        let b = a.powf(n - delta - 1.0) / an1;
        let sec = n * x * a.powf(n - 1.0) / (q * a.powf(delta) * an1 * an1);
        Ok(aa * b - sec)
    }

    fn second_derivative(&self, x: Real) -> Result<Real> {
        let (q, delta, n) = (self.q, self.delta, self.periods());
        let a = 1.0 + x / q;
        let an1 = a.powf(n) - 1.0;
        let aa = a - delta / q * x;
        let a1 = (1.0 - delta) / q;
        let b = a.powf(n - delta - 1.0) / an1;
        let num = (1.0 + delta - n) * a.powf(n - delta - 2.0)
            - (1.0 + delta) * a.powf(2.0 * n - delta - 2.0);
        let b1 = num / (q * an1 * an1);

        let c = x / a.powf(delta);
        let c1 = (a.powf(delta) - delta / q * x * a.powf(delta - 1.0)) / a.powf(2.0 * delta);
        let d = a.powf(n - 1.0) / (an1 * an1);
        let d1 = ((n - 1.0) * a.powf(n - 2.0) * an1 - 2.0 * n * a.powf(2.0 * (n - 1.0)))
            / (q * an1 * an1 * an1);

        Ok(a1 * b + aa * b1 - n / q * (c1 * d + c * d1))
    }
}

// ── ExactYield ────────────────────────────────────────────────────────────────

/// `G(x) = x (1 + τ_0 x)^(-δ) / (1 - Π 1/(1 + τ_i x))` over the actual
/// fixed-leg accruals `τ_i`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GFunctionExactYield {
    accruals: Vec<Real>,
    delta: Real,
}

impl GFunctionExactYield {
    /// Create the function from fixed-leg accruals and payment delay.
    pub fn new(accruals: Vec<Real>, delta: Real) -> Result<Self> {
        if accruals.is_empty() {
            return Err(Error::InsufficientData {
                what: "exact-yield G function".into(),
                required: 1,
                given: 0,
            });
        }
        Ok(Self { accruals, delta })
    }

    /// Create the function for the swap underlying `coupon`.
    pub fn from_coupon(coupon: &CmsCoupon) -> Result<Self> {
        Self::new(coupon.swap().accruals().to_vec(), coupon.payment_delay_ratio())
    }

    /// Returns `(b_i = 1/(1 + τ_i x), c = 1/(1 - Π b_i))`.
    fn discounts(&self, x: Real) -> (Vec<Real>, Real) {
        let b: Vec<Real> = self.accruals.iter().map(|tau| 1.0 / (1.0 + tau * x)).collect();
        let product: Real = b.iter().product();
        (b, 1.0 / (1.0 - product))
    }
}

impl GFunction for GFunctionExactYield {
    fn value(&self, x: Real) -> Result<Real> {
        let (_, c) = self.discounts(x);
        Ok(x * (1.0 + self.accruals[0] * x).powf(-self.delta) * c)
    }

    fn first_derivative(&self, x: Real) -> Result<Real> {
        let (b, c) = self.discounts(x);
        let sum: Real = self.accruals.iter().zip(&b).map(|(tau, bi)| tau * bi).sum();
        let der_c = sum * (c - c * c);
        let (tau0, delta) = (self.accruals[0], self.delta);
        let b0d = b[0].powf(delta);
        Ok(-delta * tau0 * b[0].powf(delta + 1.0) * x * c + b0d * c + b0d * x * der_c)
    }

    fn second_derivative(&self, x: Real) -> Result<Real> {
        let (b, c) = self.discounts(x);
        let (sum, sum_of_squares) = self
            .accruals
            .iter()
            .zip(&b)
            .fold((0.0, 0.0), |(s, s2), (tau, bi)| {
                let t = tau * bi;
                (s + t, s2 + t * t)
            });
        let der_c = sum * (c - c * c);
        let (tau0, delta) = (self.accruals[0], self.delta);
        let b0d = b[0].powf(delta);
        let first = (-delta * tau0 * b[0].powf(delta + 1.0) * c + b0d * der_c)
            * (-delta * tau0 * b[0] * x + 1.0 + x * (1.0 - c) * sum);
        let second = b0d
            * c
            * (delta * (tau0 * b[0]).powi(2) * x - delta * tau0 * b[0] - x * der_c * sum
                + (1.0 - c) * sum
                - x * (1.0 - c) * sum_of_squares);
        Ok(first + second)
    }
}

// ── WithShifts ────────────────────────────────────────────────────────────────

const INITIAL_SHIFT: Real = 0.03;
/// Seed of the calibration memo; no realistic swap rate equals it.
const UNSET_SWAP_RATE: Rate = 1.0e7;
const SHIFT_ACCURACY: Real = 1.0e-14;
const SHIFT_MAX_EVALUATIONS: usize = 1000;
// A swap rate whose shift falls outside these bounds has a volatility too
// high for G to be integrable.
const SHIFT_LOWER_BOUND: Real = -20.0;
const SHIFT_UPPER_BOUND: Real = 20.0;

/// `G(R_s) = R_s · Z(x(R_s))` where the current curve `P(t)` moves to
/// `P(t) e^{-x h(t)}` and `x(R_s)` is the shift reproducing the swap rate
/// `R_s`.
///
/// The shape is `h(t) = (1 - e^{-a (t - t_s)}) / a` for a mean reversion
/// `a > 0` and `h(t) = t - t_s` otherwise, with `t_s` the swap start.
/// The last calibrated `(R_s, x)` pair is memoised, so the instance must not
/// be shared across threads.
#[derive(Debug, Clone)]
pub struct GFunctionWithShifts {
    mean_reversion: Real,
    swap_rate: Rate,
    swap_start_time: Time,
    discount_at_start: DiscountFactor,
    shaped_payment_time: Time,
    accruals: Vec<Real>,
    shaped_swap_payment_times: Vec<Time>,
    swap_payment_discounts: Vec<DiscountFactor>,
    discount_ratio: Real,
    calibrated_shift: Cell<Real>,
    calibrated_swap_rate: Cell<Rate>,
}

impl GFunctionWithShifts {
    /// Create the function for `coupon` with the given mean reversion.
    pub fn new(coupon: &CmsCoupon, mean_reversion: Real) -> Result<Self> {
        let swap = coupon.swap();
        let curve = coupon.curve();
        let swap_start_time = swap.start_time();
        let shape = |t: Time| shape_of_shift(t - swap_start_time, mean_reversion);

        let discount_at_start = curve.discount(swap_start_time);
        let swap_payment_discounts: Vec<DiscountFactor> =
            swap.payment_times().iter().map(|&t| curve.discount(t)).collect();
        let last_discount = swap_payment_discounts[swap_payment_discounts.len() - 1];

        Ok(Self {
            mean_reversion,
            swap_rate: coupon.swap_rate()?,
            swap_start_time,
            discount_at_start,
            shaped_payment_time: shape(coupon.payment_time()),
            accruals: swap.accruals().to_vec(),
            shaped_swap_payment_times: swap.payment_times().iter().map(|&t| shape(t)).collect(),
            swap_payment_discounts,
            discount_ratio: last_discount / discount_at_start,
            calibrated_shift: Cell::new(INITIAL_SHIFT),
            calibrated_swap_rate: Cell::new(UNSET_SWAP_RATE),
        })
    }

    /// Mean reversion of the shift shape.
    pub fn mean_reversion(&self) -> Real {
        self.mean_reversion
    }

    /// Forward swap rate of the coupon; its calibrated shift is zero.
    pub fn swap_rate(&self) -> Rate {
        self.swap_rate
    }

    /// Curve shift `x` under which the swap fair rate equals `rs`.
    ///
    /// # Errors
    /// [`Error::Convergence`] when the Newton search fails, for instance when
    /// no shift in `[-20, 20]` reproduces `rs`.
    pub fn calibrated_shift(&self, rs: Rate) -> Result<Real> {
        if rs == self.calibrated_swap_rate.get() {
            return Ok(self.calibrated_shift.get());
        }

        let mut n = 0.0;
        let mut d = 0.0;
        for ((tau, p), s) in self
            .accruals
            .iter()
            .zip(&self.swap_payment_discounts)
            .zip(&self.shaped_swap_payment_times)
        {
            n += tau * p;
            d += tau * p * s;
        }
        let (tau_n, p_n, s_n) = self.last_payment();
        let n = n * rs + tau_n * p_n - self.discount_at_start;
        let d = d * rs + tau_n * p_n * s_n;
        let guess = (n / d).clamp(0.99 * SHIFT_LOWER_BOUND, 0.99 * SHIFT_UPPER_BOUND);

        let shift = Newton::new(SHIFT_MAX_EVALUATIONS)
            .solve(
                |x| self.objective(rs, x),
                SHIFT_ACCURACY,
                guess,
                SHIFT_LOWER_BOUND,
                SHIFT_UPPER_BOUND,
            )
            .map_err(|e| {
                #[cfg(feature = "logging")]
                tracing::error!(
                    mean_reversion = self.mean_reversion,
                    swap_rate = rs,
                    error = %e,
                    "shift calibration failed"
                );
                Error::Convergence(format!(
                    "mean reversion: {}, swap rate: {}, swap start time: {}, \
                     shaped payment time: {}: {e}",
                    self.mean_reversion,
                    self.swap_rate,
                    self.swap_start_time,
                    self.shaped_payment_time
                ))
            })?;

        #[cfg(feature = "logging")]
        tracing::trace!(swap_rate = rs, shift, "calibrated curve shift");

        self.calibrated_shift.set(shift);
        self.calibrated_swap_rate.set(rs);
        Ok(shift)
    }

    /// Swap fair-rate identity `R_s A(x) + P_n e^{-S_n x} - P_s` and its
    /// derivative in `x`.
    fn objective(&self, rs: Rate, x: Real) -> (Real, Real) {
        let mut value = 0.0;
        let mut derivative = 0.0;
        for ((tau, p), s) in self
            .accruals
            .iter()
            .zip(&self.swap_payment_discounts)
            .zip(&self.shaped_swap_payment_times)
        {
            let temp = tau * p * (-s * x).exp();
            value += temp;
            derivative -= s * temp;
        }
        value *= rs;
        derivative *= rs;
        let (_, p_n, s_n) = self.last_payment();
        let temp = p_n * (-s_n * x).exp();
        value += temp - self.discount_at_start;
        derivative -= s_n * temp;
        (value, derivative)
    }

    fn last_payment(&self) -> (Real, DiscountFactor, Time) {
        let last = self.accruals.len() - 1;
        (
            self.accruals[last],
            self.swap_payment_discounts[last],
            self.shaped_swap_payment_times[last],
        )
    }

    /// Shifted annuity `Σ τ_i P_i e^{-S_i x}` with its first and second
    /// derivatives.
    fn shifted_annuity(&self, x: Real) -> (Real, Real, Real) {
        self.accruals
            .iter()
            .zip(&self.swap_payment_discounts)
            .zip(&self.shaped_swap_payment_times)
            .fold((0.0, 0.0, 0.0), |(a0, a1, a2), ((tau, p), s)| {
                let temp = tau * p * (-s * x).exp();
                (a0 + temp, a1 - s * temp, a2 + s * s * temp)
            })
    }

    fn function_z(&self, x: Real) -> Real {
        let (_, _, s_n) = self.last_payment();
        (-self.shaped_payment_time * x).exp() / (1.0 - self.discount_ratio * (-s_n * x).exp())
    }

    fn der_rs_der_x(&self, x: Real) -> Result<Real> {
        let (annuity, der_annuity, _) = self.shifted_annuity(x);
        let (_, p_n, s_n) = self.last_payment();
        let e_n = p_n * (-s_n * x).exp();
        let denominator = annuity * annuity;
        cn_core::ensure!(denominator != 0.0, "dRs/dx: denominator == 0");
        let numerator = s_n * e_n * annuity - (self.discount_at_start - e_n) * der_annuity;
        Ok(numerator / denominator)
    }

    fn der2_rs_der_x2(&self, x: Real) -> Result<Real> {
        let (annuity, der_annuity, der2_annuity) = self.shifted_annuity(x);
        let (_, p_n, s_n) = self.last_payment();
        let e_n = p_n * (-s_n * x).exp();
        let denominator = annuity.powi(4);
        cn_core::ensure!(denominator != 0.0, "d2Rs/dx2: denominator == 0");

        let num_of_der = s_n * e_n * annuity - (self.discount_at_start - e_n) * der_annuity;
        let der_num_of_der = -s_n * s_n * e_n * annuity + s_n * e_n * der_annuity
            - s_n * e_n * der_annuity
            - (self.discount_at_start - e_n) * der2_annuity;
        let den_of_der = annuity * annuity;
        let der_den_of_der = 2.0 * annuity * der_annuity;
        Ok((der_num_of_der * den_of_der - num_of_der * der_den_of_der) / denominator)
    }

    fn der_z_der_x(&self, x: Real) -> Result<Real> {
        let (_, _, s_n) = self.last_payment();
        let s_p = self.shaped_payment_time;
        let den = 1.0 - self.discount_ratio * (-s_n * x).exp();
        let denominator = den * den;
        cn_core::ensure!(denominator != 0.0, "dZ/dx: denominator == 0");
        let e_p = (-s_p * x).exp();
        let numerator = -s_p * e_p * den - s_n * e_p * (1.0 - den);
        Ok(numerator / denominator)
    }

    fn der2_z_der_x2(&self, x: Real) -> Result<Real> {
        let (_, _, s_n) = self.last_payment();
        let s_p = self.shaped_payment_time;
        let ratio = self.discount_ratio;
        let e_n = (-s_n * x).exp();
        let e_p = (-s_p * x).exp();
        let den = 1.0 - ratio * e_n;
        let der_den = s_n * ratio * e_n;
        let denominator = den.powi(4);
        cn_core::ensure!(denominator != 0.0, "d2Z/dx2: denominator == 0");

        let num_of_der = -s_p * e_p * den - s_n * e_p * (1.0 - den);
        let der_num_of_der = -s_p * e_p * (-s_p + (s_p * ratio - s_n * ratio) * e_n)
            - s_n * e_p * (s_p * ratio - s_n * ratio) * e_n;
        let den_of_der = den * den;
        let der_den_of_der = 2.0 * den * der_den;
        Ok((der_num_of_der * den_of_der - num_of_der * der_den_of_der) / denominator)
    }
}

fn shape_of_shift(elapsed: Time, mean_reversion: Real) -> Time {
    if mean_reversion > 0.0 {
        (1.0 - (-mean_reversion * elapsed).exp()) / mean_reversion
    } else {
        elapsed
    }
}

impl GFunction for GFunctionWithShifts {
    fn value(&self, rs: Real) -> Result<Real> {
        let shift = self.calibrated_shift(rs)?;
        Ok(rs * self.function_z(shift))
    }

    fn first_derivative(&self, rs: Real) -> Result<Real> {
        let shift = self.calibrated_shift(rs)?;
        Ok(self.function_z(shift) + rs * self.der_z_der_x(shift)? / self.der_rs_der_x(shift)?)
    }

    fn second_derivative(&self, rs: Real) -> Result<Real> {
        let shift = self.calibrated_shift(rs)?;
        let dz = self.der_z_der_x(shift)?;
        let drs = self.der_rs_der_x(shift)?;
        Ok(2.0 * dz / drs + rs * self.der2_z_der_x2(shift)? / drs.powi(2)
            - rs * dz * self.der2_rs_der_x2(shift)? / drs.powi(3))
    }
}
