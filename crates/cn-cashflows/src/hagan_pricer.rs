//! Hagan convexity-adjusted CMS coupon pricers (translates the `HaganPricer`
//! family of `ql/cashflows/conundrumpricer.hpp`).
//!
//! A pricer is bound to one coupon at a time through
//! [`HaganPricer::initialize`]; every price query before that fails with
//! [`Error::NullValue`]. Once the fixing time has passed the prices reduce to
//! intrinsic values against the realised fixing. Otherwise:
//!
//! - [`NumericHaganPricer`] replicates the optionlets with swaptions and
//!   integrates the [`ConundrumIntegrand`] (Hagan 2.17a/2.18a);
//! - [`AnalyticHaganPricer`] uses the closed form obtained by linearising
//!   `G` around the forward swap rate (Hagan 3.4c/3.5b/3.5c).

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use cn_core::{
    errors::{Error, Result},
    DiscountFactor, Rate, Real, Spread, Time,
};
use cn_math::{
    distributions::normal_cdf,
    integrals::{GaussKronrodAdaptive, GaussKronrodNonAdaptive, Integrator},
};
use cn_pricingengines::OptionType;
use cn_termstructures::SwaptionVolatilityStructure;

use crate::cms_coupon::CmsCoupon;
use crate::conundrum_integrand::ConundrumIntegrand;
use crate::g_function::{g_function, GFunction, YieldCurveModel};
use crate::vanilla_option_pricer::{BlackVanillaOptionPricer, VanillaOptionPricer};

/// Caps at or above this level are worthless.
pub const CAPLET_CUTOFF: Rate = 2.0;
/// Floors at or below this level are worthless.
pub const FLOORLET_CUTOFF: Rate = 0.0;
/// Smallest strike passed to the optionlet pricers.
pub const NEAR_ZERO_STRIKE: Rate = 1.0e-10;

// ────────────────────────────────────────────────────────────────────────────
// Coupon state
// ────────────────────────────────────────────────────────────────────────────

/// Quantities a Hagan pricer extracts from its coupon on initialisation.
#[derive(Debug)]
pub struct HaganState {
    accrual_period: Real,
    gearing: Real,
    spread: Spread,
    discount: DiscountFactor,
    spread_leg_value: Real,
    fixing: Fixing,
}

#[derive(Debug)]
enum Fixing {
    Realised(Rate),
    Projected(Projection),
}

/// Forward-looking data, only built while the fixing is in the future.
#[derive(Debug)]
struct Projection {
    swap_rate: Rate,
    annuity: Real,
    fixing_time: Time,
    swap_length: Time,
    volatility: Arc<dyn SwaptionVolatilityStructure>,
    g_function: Box<dyn GFunction>,
    vanilla_option_pricer: BlackVanillaOptionPricer,
}

impl Projection {
    /// Black variance of the swap rate at the money.
    fn variance(&self) -> Result<Real> {
        self.volatility
            .black_variance(self.fixing_time, self.swap_length, self.swap_rate)
    }
}

impl HaganState {
    fn new(
        coupon: &CmsCoupon,
        volatility: &Arc<dyn SwaptionVolatilityStructure>,
        model: YieldCurveModel,
        mean_reversion: Real,
    ) -> Result<Self> {
        let accrual_period = coupon.accrual_period();
        cn_core::ensure!(accrual_period != 0.0, "null accrual period");
        let discount = coupon.payment_discount();
        let spread = coupon.spread();

        let fixing = if coupon.is_fixed() {
            Fixing::Realised(coupon.index_fixing()?)
        } else {
            let swap_rate = coupon.swap_rate()?;
            let swap_length = coupon.swap().tenor();
            let fixing_time = coupon.fixing_time();
            Fixing::Projected(Projection {
                swap_rate,
                annuity: coupon.annuity(),
                fixing_time,
                swap_length,
                volatility: Arc::clone(volatility),
                g_function: g_function(model, coupon, mean_reversion)?,
                vanilla_option_pricer: BlackVanillaOptionPricer::new(
                    swap_rate,
                    fixing_time,
                    swap_length,
                    Arc::clone(volatility),
                ),
            })
        };

        Ok(Self {
            accrual_period,
            gearing: coupon.gearing(),
            spread,
            discount,
            spread_leg_value: spread * accrual_period * discount,
            fixing,
        })
    }

    /// Accrual period of the coupon.
    pub fn accrual_period(&self) -> Real {
        self.accrual_period
    }

    /// Gearing of the coupon.
    pub fn gearing(&self) -> Real {
        self.gearing
    }

    /// Discount factor to the payment time (1 once paid).
    pub fn discount(&self) -> DiscountFactor {
        self.discount
    }

    /// Present value of the spread leg, `spread · accrual · discount`.
    pub fn spread_leg_value(&self) -> Real {
        self.spread_leg_value
    }

    /// The realised swap rate, if the fixing time has passed.
    pub fn realised_fixing(&self) -> Option<Rate> {
        match self.fixing {
            Fixing::Realised(rate) => Some(rate),
            Fixing::Projected(_) => None,
        }
    }

    /// Forward swap rate, if the fixing is in the future.
    pub fn swap_rate(&self) -> Option<Rate> {
        self.projection().ok().map(|p| p.swap_rate)
    }

    /// Annuity of the underlying swap, if the fixing is in the future.
    pub fn annuity(&self) -> Option<Real> {
        self.projection().ok().map(|p| p.annuity)
    }

    /// `G` function of the coupon, if the fixing is in the future.
    pub fn g_function(&self) -> Option<&dyn GFunction> {
        self.projection().ok().map(|p| p.g_function.as_ref())
    }

    /// Coupon prices are divided by this to give rates.
    fn deflator(&self) -> Real {
        self.accrual_period * self.discount
    }

    /// Intrinsic price against the realised fixing.
    fn realised_price(&self, rate: Rate) -> Real {
        self.gearing * rate * self.deflator()
    }

    fn projection(&self) -> Result<&Projection> {
        match &self.fixing {
            Fixing::Projected(projection) => Ok(projection),
            Fixing::Realised(_) => Err(Error::Runtime(
                "the coupon fixing is already determined".into(),
            )),
        }
    }
}

/// Shared configuration and coupon state of the two pricers.
#[derive(Debug)]
struct HaganCore {
    volatility: Arc<dyn SwaptionVolatilityStructure>,
    model: YieldCurveModel,
    mean_reversion: Real,
    state: Option<HaganState>,
}

impl HaganCore {
    fn new(
        volatility: Arc<dyn SwaptionVolatilityStructure>,
        model: YieldCurveModel,
        mean_reversion: Real,
    ) -> Self {
        Self {
            volatility,
            model,
            mean_reversion,
            state: None,
        }
    }

    fn initialize(&mut self, coupon: &CmsCoupon) -> Result<()> {
        let state = HaganState::new(coupon, &self.volatility, self.model, self.mean_reversion)?;
        #[cfg(feature = "logging")]
        tracing::debug!(
            model = ?self.model,
            mean_reversion = self.mean_reversion,
            swap_rate = ?state.swap_rate(),
            annuity = ?state.annuity(),
            discount = state.discount,
            "initialised Hagan pricer"
        );
        self.state = Some(state);
        Ok(())
    }

    fn state(&self) -> Result<&HaganState> {
        self.state
            .as_ref()
            .ok_or_else(|| Error::NullValue("pricer not initialised with a CMS coupon".into()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HaganPricer
// ────────────────────────────────────────────────────────────────────────────

/// Convexity-adjusted pricer of CMS swaplets, caplets and floorlets.
///
/// Prices are per unit notional and include the payment-time discount;
/// rates are prices divided by `accrual · discount`.
pub trait HaganPricer: fmt::Debug {
    /// Bind the pricer to `coupon`.
    fn initialize(&mut self, coupon: &CmsCoupon) -> Result<()>;

    /// State extracted from the current coupon.
    fn state(&self) -> Result<&HaganState>;

    /// Mean reversion used by [`YieldCurveModel::NonParallelShifts`].
    fn mean_reversion(&self) -> Real;

    /// Yield-curve model of the `G` function.
    fn model(&self) -> YieldCurveModel;

    /// Price of an optionlet on the swap rate, before gearing.
    fn optionlet_price(&self, option_type: OptionType, strike: Rate) -> Result<Real>;

    /// Price of `gearing · R + spread` paid at the payment time.
    fn swaplet_price(&self) -> Result<Real>;

    /// Convexity-adjusted coupon rate.
    fn swaplet_rate(&self) -> Result<Rate> {
        Ok(self.swaplet_price()? / self.state()?.deflator())
    }

    /// Price of `gearing · max(R - K, 0)`.
    fn caplet_price(&self, effective_cap: Rate) -> Result<Real> {
        let state = self.state()?;
        if let Some(fixing) = state.realised_fixing() {
            return Ok(state.realised_price((fixing - effective_cap).max(0.0)));
        }
        let mut price = 0.0;
        if effective_cap < CAPLET_CUTOFF {
            price = self.optionlet_price(OptionType::Call, effective_cap.max(NEAR_ZERO_STRIKE))?;
        }
        Ok(state.gearing * price)
    }

    /// [`caplet_price`](Self::caplet_price) as a rate.
    fn caplet_rate(&self, effective_cap: Rate) -> Result<Rate> {
        Ok(self.caplet_price(effective_cap)? / self.state()?.deflator())
    }

    /// Price of `gearing · max(K - R, 0)`.
    fn floorlet_price(&self, effective_floor: Rate) -> Result<Real> {
        let state = self.state()?;
        if let Some(fixing) = state.realised_fixing() {
            return Ok(state.realised_price((effective_floor - fixing).max(0.0)));
        }
        let mut price = 0.0;
        if effective_floor > FLOORLET_CUTOFF {
            price =
                self.optionlet_price(OptionType::Put, effective_floor.max(NEAR_ZERO_STRIKE))?;
        }
        Ok(state.gearing * price)
    }

    /// [`floorlet_price`](Self::floorlet_price) as a rate.
    fn floorlet_rate(&self, effective_floor: Rate) -> Result<Rate> {
        Ok(self.floorlet_price(effective_floor)? / self.state()?.deflator())
    }
}

/// Swaplet price once the fixing is known.
fn realised_swaplet_price(state: &HaganState, fixing: Rate) -> Real {
    (state.gearing * fixing + state.spread) * state.deflator()
}

// ────────────────────────────────────────────────────────────────────────────
// NumericHaganPricer
// ────────────────────────────────────────────────────────────────────────────

/// Integration settings of [`NumericHaganPricer`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NumericHaganSettings {
    /// Lower integration limit of floorlets (used when below the strike).
    pub lower_limit: Real,
    /// Initial upper integration limit of caplets; every caplet replaces it
    /// with `R · exp(n σ√T)`.
    pub upper_limit: Real,
    /// Absolute integration accuracy, also the level below which the
    /// integrand counts as negligible.
    pub precision: Real,
    /// No integration goes beyond this rate.
    pub hard_upper_limit: Real,
    /// Standard deviations `n` covered by the caplet integration.
    pub required_std_deviations: Real,
}

impl Default for NumericHaganSettings {
    fn default() -> Self {
        Self {
            lower_limit: 0.0,
            upper_limit: 1.0,
            precision: 1.0e-6,
            hard_upper_limit: Real::MAX,
            required_std_deviations: 8.0,
        }
    }
}

impl NumericHaganSettings {
    fn validate(&self) -> Result<()> {
        cn_core::ensure!(
            self.precision > 0.0,
            "integration precision ({}) must be positive",
            self.precision
        );
        cn_core::ensure!(
            self.hard_upper_limit > self.lower_limit,
            "hard upper limit ({}) must exceed the lower limit ({})",
            self.hard_upper_limit,
            self.lower_limit
        );
        cn_core::ensure!(
            self.required_std_deviations > 0.0,
            "required standard deviations ({}) must be positive",
            self.required_std_deviations
        );
        Ok(())
    }
}

const NON_ADAPTIVE_MAX_EVALUATIONS: usize = 1_000_000;
const ADAPTIVE_MAX_EVALUATIONS: usize = 100_000;

/// Hagan pricer integrating the swaption replication numerically.
///
/// Corresponds to `QuantLib::NumericHaganPricer`.
#[derive(Debug)]
pub struct NumericHaganPricer {
    core: HaganCore,
    settings: NumericHaganSettings,
    upper_limit: Cell<Real>,
}

impl NumericHaganPricer {
    /// Pricer with default integration settings.
    pub fn new(
        volatility: Arc<dyn SwaptionVolatilityStructure>,
        model: YieldCurveModel,
        mean_reversion: Real,
    ) -> Self {
        let settings = NumericHaganSettings::default();
        Self {
            core: HaganCore::new(volatility, model, mean_reversion),
            upper_limit: Cell::new(settings.upper_limit),
            settings,
        }
    }

    /// Pricer with explicit integration settings.
    pub fn with_settings(
        volatility: Arc<dyn SwaptionVolatilityStructure>,
        model: YieldCurveModel,
        mean_reversion: Real,
        settings: NumericHaganSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            core: HaganCore::new(volatility, model, mean_reversion),
            upper_limit: Cell::new(settings.upper_limit),
            settings,
        })
    }

    /// Integration settings.
    pub fn settings(&self) -> &NumericHaganSettings {
        &self.settings
    }

    /// Upper integration limit of the last caplet.
    pub fn upper_limit(&self) -> Real {
        self.upper_limit.get()
    }

    /// Change the mean reversion; takes effect at the next
    /// [`initialize`](HaganPricer::initialize).
    pub fn set_mean_reversion(&mut self, mean_reversion: Real) {
        self.core.mean_reversion = mean_reversion;
    }

    /// `R · exp(n σ√T)`.
    fn reset_upper_limit(&self, projection: &Projection, std_deviations: Real) -> Result<Real> {
        let variance = projection.variance()?;
        Ok(projection.swap_rate * (std_deviations * variance.sqrt()).exp())
    }

    fn integrate(&self, a: Real, b: Real, integrand: &ConundrumIntegrand<'_>) -> Result<Real> {
        let precision = self.settings.precision;
        let hard_upper_limit = self.settings.hard_upper_limit;
        let f = |x: Real| integrand.value(x);
        let adaptive = || -> Result<Real> {
            let b = a.max(b.min(hard_upper_limit));
            GaussKronrodAdaptive::new(precision, ADAPTIVE_MAX_EVALUATIONS)?.try_integrate(f, a, b)
        };

        // non-positive lower limits go straight to the adaptive rule
        if a <= 0.0 {
            return adaptive();
        }

        // find where the integrand becomes negligible
        let mut upper_boundary = 2.0 * a;
        while upper_boundary < hard_upper_limit && f(upper_boundary)? > precision {
            upper_boundary *= 2.0;
        }
        // the standard-deviation estimate of b can fall below a
        if b > a {
            upper_boundary = upper_boundary.min(b);
        }
        upper_boundary = a.max(upper_boundary.min(hard_upper_limit));

        let non_adaptive =
            GaussKronrodNonAdaptive::new(precision, NON_ADAPTIVE_MAX_EVALUATIONS, 1.0);
        let result = if upper_boundary > 2.0 * a {
            // x = a + (ub - a) t^3 clusters the nodes near the strike
            let width = upper_boundary - a;
            non_adaptive.try_integrate(
                |t| {
                    let temp = width * t * t;
                    Ok(f(a + t * temp)? * 3.0 * temp)
                },
                0.0,
                1.0,
            )?
        } else {
            non_adaptive.try_integrate(f, a, upper_boundary)?
        };
        if non_adaptive.integration_success() {
            return Ok(result);
        }

        #[cfg(feature = "logging")]
        tracing::warn!(
            lower = a,
            upper = upper_boundary,
            error = non_adaptive.absolute_error(),
            precision,
            "non-adaptive Gauss-Kronrod missed the precision, falling back to the adaptive rule"
        );
        adaptive()
    }
}

impl HaganPricer for NumericHaganPricer {
    fn initialize(&mut self, coupon: &CmsCoupon) -> Result<()> {
        self.core.initialize(coupon)
    }

    fn state(&self) -> Result<&HaganState> {
        self.core.state()
    }

    fn mean_reversion(&self) -> Real {
        self.core.mean_reversion
    }

    fn model(&self) -> YieldCurveModel {
        self.core.model
    }

    fn optionlet_price(&self, option_type: OptionType, strike: Rate) -> Result<Real> {
        let state = self.core.state()?;
        let projection = state.projection()?;
        let integrand = ConundrumIntegrand::new(
            &projection.vanilla_option_pricer,
            projection.g_function.as_ref(),
            projection.annuity,
            projection.swap_rate,
            strike,
            option_type,
        );

        let integral = match option_type {
            OptionType::Call => {
                let upper_limit =
                    self.reset_upper_limit(projection, self.settings.required_std_deviations)?;
                self.upper_limit.set(upper_limit);
                self.integrate(strike, upper_limit, &integrand)?
            }
            OptionType::Put => {
                let lower_limit = strike.min(self.settings.lower_limit);
                self.integrate(lower_limit, strike, &integrand)?
            }
        };

        let df_dk = integrand.first_derivative_of_f(strike)?;
        let swaption =
            projection
                .vanilla_option_pricer
                .price(strike, option_type, projection.annuity)?;
        Ok(state.accrual_period
            * (state.discount / projection.annuity)
            * ((1.0 + df_dk) * swaption + option_type.sign() * integral))
    }

    fn swaplet_price(&self) -> Result<Real> {
        let state = self.core.state()?;
        if let Some(fixing) = state.realised_fixing() {
            return Ok(realised_swaplet_price(state, fixing));
        }
        let swap_rate = state.projection()?.swap_rate;
        let atm_caplet = self.optionlet_price(OptionType::Call, swap_rate)?;
        let atm_floorlet = self.optionlet_price(OptionType::Put, swap_rate)?;
        Ok(state.gearing * (state.deflator() * swap_rate + atm_caplet - atm_floorlet)
            + state.spread_leg_value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AnalyticHaganPricer
// ────────────────────────────────────────────────────────────────────────────

/// Hagan pricer using the closed form of the linearised `G` function.
///
/// Corresponds to `QuantLib::AnalyticHaganPricer`.
#[derive(Debug)]
pub struct AnalyticHaganPricer {
    core: HaganCore,
}

impl AnalyticHaganPricer {
    /// Create the pricer.
    pub fn new(
        volatility: Arc<dyn SwaptionVolatilityStructure>,
        model: YieldCurveModel,
        mean_reversion: Real,
    ) -> Self {
        Self {
            core: HaganCore::new(volatility, model, mean_reversion),
        }
    }

    /// Change the mean reversion; takes effect at the next
    /// [`initialize`](HaganPricer::initialize).
    pub fn set_mean_reversion(&mut self, mean_reversion: Real) {
        self.core.mean_reversion = mean_reversion;
    }
}

impl HaganPricer for AnalyticHaganPricer {
    fn initialize(&mut self, coupon: &CmsCoupon) -> Result<()> {
        self.core.initialize(coupon)
    }

    fn state(&self) -> Result<&HaganState> {
        self.core.state()
    }

    fn mean_reversion(&self) -> Real {
        self.core.mean_reversion
    }

    fn model(&self) -> YieldCurveModel {
        self.core.model
    }

    // Hagan 3.5b, 3.5c
    fn optionlet_price(&self, option_type: OptionType, strike: Rate) -> Result<Real> {
        let state = self.core.state()?;
        let projection = state.projection()?;
        let r = projection.swap_rate;
        let annuity = projection.annuity;
        let variance = projection.variance()?;
        let g1 = projection.g_function.first_derivative(r)?;

        let swaption = projection
            .vanilla_option_pricer
            .price(strike, option_type, annuity)?;
        let mut price = (state.discount / annuity) * swaption;

        let std_dev = variance.sqrt();
        let ln_r_over_k = (r / strike).ln();
        let d32 = (ln_r_over_k + 1.5 * variance) / std_dev;
        let d12 = (ln_r_over_k + 0.5 * variance) / std_dev;
        let dminus12 = (ln_r_over_k - 0.5 * variance) / std_dev;

        let sign = option_type.sign();
        let n32 = normal_cdf(sign * d32);
        let n12 = normal_cdf(sign * d12);
        let nminus12 = normal_cdf(sign * dminus12);

        price += sign * g1 * annuity * r
            * (r * variance.exp() * n32 - (r + strike) * n12 + strike * nminus12);
        Ok(price * state.accrual_period)
    }

    // Hagan 3.4c
    fn swaplet_price(&self) -> Result<Real> {
        let state = self.core.state()?;
        if let Some(fixing) = state.realised_fixing() {
            return Ok(realised_swaplet_price(state, fixing));
        }
        let projection = state.projection()?;
        let r = projection.swap_rate;
        let variance = projection.variance()?;
        let g1 = projection.g_function.first_derivative(r)?;
        let price = state.discount * r + g1 * projection.annuity * r * r * (variance.exp() - 1.0);
        Ok(state.gearing * price * state.accrual_period + state.spread_leg_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms_coupon::SwapSchedule;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use cn_termstructures::{ConstantSwaptionVolatility, FlatForward};

    fn volatility(vol: Real) -> Arc<dyn SwaptionVolatilityStructure> {
        Arc::new(ConstantSwaptionVolatility::new(vol).unwrap())
    }

    /// Semi-annual 10y swap fixing in 5y on a flat 4% curve, paid 6m later.
    fn coupon() -> CmsCoupon {
        let swap = SwapSchedule::regular(5.0, 10.0, 2).unwrap();
        CmsCoupon::new(Arc::new(FlatForward::new(0.04)), swap, 5.0, 5.5, 0.5)
    }

    fn numeric(model: YieldCurveModel) -> NumericHaganPricer {
        let mut pricer = NumericHaganPricer::new(volatility(0.15), model, 0.0);
        pricer.initialize(&coupon()).unwrap();
        pricer
    }

    fn analytic(model: YieldCurveModel) -> AnalyticHaganPricer {
        let mut pricer = AnalyticHaganPricer::new(volatility(0.15), model, 0.0);
        pricer.initialize(&coupon()).unwrap();
        pricer
    }

    #[test]
    fn uninitialised_pricer_is_a_null_value() {
        let pricer = NumericHaganPricer::new(volatility(0.2), YieldCurveModel::Standard, 0.0);
        assert!(matches!(pricer.swaplet_price(), Err(Error::NullValue(_))));
        assert!(matches!(pricer.caplet_rate(0.03), Err(Error::NullValue(_))));
        let pricer = AnalyticHaganPricer::new(volatility(0.2), YieldCurveModel::Standard, 0.0);
        assert!(matches!(pricer.floorlet_price(0.03), Err(Error::NullValue(_))));
    }

    #[test]
    fn null_accrual_period_is_rejected() {
        let swap = SwapSchedule::regular(5.0, 10.0, 2).unwrap();
        let cpn = CmsCoupon::new(Arc::new(FlatForward::new(0.04)), swap, 5.0, 5.5, 0.0);
        let mut pricer = AnalyticHaganPricer::new(volatility(0.2), YieldCurveModel::Standard, 0.0);
        assert!(pricer.initialize(&cpn).is_err());
    }

    #[test]
    fn analytic_swaplet_at_a_known_point() {
        let pricer = analytic(YieldCurveModel::Standard);
        let state = pricer.state().unwrap();
        assert_relative_eq!(state.annuity().unwrap(), 6.680_723_076_450_847, max_relative = 1e-13);
        assert_relative_eq!(state.swap_rate().unwrap(), 0.040_402_680_053_511_62, max_relative = 1e-13);
        assert_relative_eq!(
            pricer.swaplet_rate().unwrap(),
            0.041_244_479_528_381_8,
            max_relative = 1e-11
        );
    }

    #[test]
    fn analytic_put_call_parity_is_exact() {
        let pricer = analytic(YieldCurveModel::Standard);
        let state = pricer.state().unwrap();
        let swaplet = pricer.swaplet_price().unwrap();
        for strike in [0.02, 0.04, 0.06] {
            let caplet = pricer.caplet_price(strike).unwrap();
            let floorlet = pricer.floorlet_price(strike).unwrap();
            let forward = swaplet - strike * state.accrual_period() * state.discount();
            assert_abs_diff_eq!(caplet - floorlet, forward, epsilon = 1e-13);
        }
    }

    #[test]
    fn numeric_matches_analytic() {
        let numeric = numeric(YieldCurveModel::Standard);
        let analytic = analytic(YieldCurveModel::Standard);
        assert_abs_diff_eq!(
            numeric.swaplet_rate().unwrap(),
            analytic.swaplet_rate().unwrap(),
            epsilon = 5e-5
        );
        for strike in [0.02, 0.04, 0.06] {
            assert_abs_diff_eq!(
                numeric.caplet_price(strike).unwrap(),
                analytic.caplet_price(strike).unwrap(),
                epsilon = 2e-5
            );
            assert_abs_diff_eq!(
                numeric.floorlet_price(strike).unwrap(),
                analytic.floorlet_price(strike).unwrap(),
                epsilon = 2e-5
            );
        }
        assert!(numeric.upper_limit() > 0.04);
    }

    #[test]
    fn numeric_swaplet_at_a_known_point() {
        let pricer = numeric(YieldCurveModel::Standard);
        assert_abs_diff_eq!(pricer.swaplet_rate().unwrap(), 0.041_256_090_735_746_05, epsilon = 1e-6);
    }

    #[test]
    fn cutoffs() {
        let pricer = numeric(YieldCurveModel::Standard);
        assert_eq!(pricer.caplet_price(CAPLET_CUTOFF).unwrap(), 0.0);
        assert_eq!(pricer.floorlet_price(FLOORLET_CUTOFF).unwrap(), 0.0);
        assert_eq!(pricer.floorlet_price(-0.01).unwrap(), 0.0);
        // a negative cap is priced as a near-zero strike
        assert_eq!(
            pricer.caplet_price(-0.01).unwrap(),
            pricer.caplet_price(NEAR_ZERO_STRIKE).unwrap()
        );
    }

    #[test]
    fn gearing_and_spread() {
        let cpn = coupon().with_gearing(2.0).with_spread(0.001);
        let mut pricer = AnalyticHaganPricer::new(volatility(0.15), YieldCurveModel::Standard, 0.0);
        pricer.initialize(&cpn).unwrap();
        let base = analytic(YieldCurveModel::Standard).swaplet_rate().unwrap();
        assert_relative_eq!(pricer.swaplet_rate().unwrap(), 2.0 * base + 0.001, max_relative = 1e-13);
        let base_caplet = analytic(YieldCurveModel::Standard).caplet_price(0.04).unwrap();
        assert_relative_eq!(pricer.caplet_price(0.04).unwrap(), 2.0 * base_caplet, max_relative = 1e-14);
    }

    #[test]
    fn realised_fixing_pays_intrinsic_value() {
        let swap = SwapSchedule::regular(-0.1, 10.0, 2).unwrap();
        let curve = Arc::new(FlatForward::new(0.04));
        let cpn = CmsCoupon::new(curve, swap, -0.1, 0.4, 0.5)
            .with_spread(0.002)
            .with_fixing(0.035);
        let deflator = 0.5 * (-0.04_f64 * 0.4).exp();
        let pricers: [Box<dyn HaganPricer>; 2] = [
            Box::new(NumericHaganPricer::new(volatility(0.2), YieldCurveModel::Standard, 0.0)),
            Box::new(AnalyticHaganPricer::new(volatility(0.2), YieldCurveModel::Standard, 0.0)),
        ];
        for mut pricer in pricers {
            pricer.initialize(&cpn).unwrap();
            assert_relative_eq!(pricer.swaplet_rate().unwrap(), 0.037, max_relative = 1e-14);
            assert_relative_eq!(pricer.caplet_price(0.03).unwrap(), 0.005 * deflator, max_relative = 1e-12);
            assert_eq!(pricer.caplet_price(0.04).unwrap(), 0.0);
            assert_relative_eq!(pricer.floorlet_rate(0.04).unwrap(), 0.005, max_relative = 1e-12);
            assert!(pricer.optionlet_price(OptionType::Call, 0.03).is_err());
            assert!(pricer.state().unwrap().swap_rate().is_none());
        }
    }

    #[test]
    fn missing_fixing_is_a_null_value() {
        let swap = SwapSchedule::regular(0.0, 10.0, 2).unwrap();
        let cpn = CmsCoupon::new(Arc::new(FlatForward::new(0.04)), swap, 0.0, 0.5, 0.5);
        let mut pricer = NumericHaganPricer::new(volatility(0.2), YieldCurveModel::Standard, 0.0);
        assert!(matches!(pricer.initialize(&cpn), Err(Error::NullValue(_))));
    }

    #[test]
    fn parallel_shifts_reproduce_the_standard_replication_on_a_flat_curve() {
        let standard = numeric(YieldCurveModel::Standard);
        let parallel = numeric(YieldCurveModel::ParallelShifts);
        for strike in [0.03, 0.05] {
            assert_abs_diff_eq!(
                standard.caplet_price(strike).unwrap(),
                parallel.caplet_price(strike).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn mean_reversion_raises_the_adjustment() {
        let mut pricer =
            AnalyticHaganPricer::new(volatility(0.15), YieldCurveModel::NonParallelShifts, 0.0);
        pricer.initialize(&coupon()).unwrap();
        let without = pricer.swaplet_rate().unwrap();
        pricer.set_mean_reversion(0.1);
        assert_eq!(pricer.mean_reversion(), 0.1);
        pricer.initialize(&coupon()).unwrap();
        let with = pricer.swaplet_rate().unwrap();
        assert_relative_eq!(without, 0.041_261_485_005_807_99, max_relative = 1e-9);
        assert_relative_eq!(with, 0.041_339_110_453_405_76, max_relative = 1e-9);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings: NumericHaganSettings =
            serde_json::from_str(r#"{"precision": 1e-8, "required_std_deviations": 6.0}"#).unwrap();
        assert_eq!(settings.precision, 1e-8);
        assert_eq!(settings.required_std_deviations, 6.0);
        assert_eq!(settings.upper_limit, 1.0);
        assert_eq!(settings.hard_upper_limit, Real::MAX);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = NumericHaganSettings {
            precision: 0.0,
            ..NumericHaganSettings::default()
        };
        assert!(NumericHaganPricer::with_settings(
            volatility(0.2),
            YieldCurveModel::Standard,
            0.0,
            settings
        )
        .is_err());
    }
}
