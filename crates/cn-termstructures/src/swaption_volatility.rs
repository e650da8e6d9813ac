//! Swaption volatility structures (translates
//! `ql/termstructures/volatility/swaption/swaptionvolstructure.hpp`).
//!
//! A swaption volatility is indexed by option time, length of the underlying
//! swap (both in years) and strike. The CMS pricers only ever ask for the
//! Black variance `σ²·t` of one (option time, swap length) pair across
//! strikes.

use cn_core::{errors::Result, Real, Time, Volatility};
use cn_math::interpolations::{cubic::NATURAL, DerivativeApprox, PiecewiseCubic};

use crate::term_structure::TermStructure;

/// A swaption (Black) volatility structure.
///
/// Implementors provide [`volatility_impl`](Self::volatility_impl); the
/// variance follows as `σ²·t`.
///
/// Corresponds to `QuantLib::SwaptionVolatilityStructure`.
pub trait SwaptionVolatilityStructure: TermStructure {
    /// Black volatility for the given option time, swap length and strike.
    fn volatility_impl(&self, option_time: Time, swap_length: Time, strike: Real) -> Volatility;

    /// Black volatility; checks the option time against the curve range.
    fn volatility(&self, option_time: Time, swap_length: Time, strike: Real) -> Result<Volatility> {
        self.check_range(option_time)?;
        Ok(self.volatility_impl(option_time, swap_length, strike))
    }

    /// Black variance `σ²·t`; checks the option time against the curve
    /// range.
    fn black_variance(&self, option_time: Time, swap_length: Time, strike: Real) -> Result<Real> {
        let vol = self.volatility(option_time, swap_length, strike)?;
        Ok(vol * vol * option_time)
    }
}

// ── ConstantSwaptionVolatility ────────────────────────────────────────────────

/// Flat swaption volatility, independent of option time, swap length and
/// strike.
///
/// Corresponds to `QuantLib::ConstantSwaptionVolatility`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantSwaptionVolatility {
    volatility: Volatility,
}

impl ConstantSwaptionVolatility {
    /// Create a flat volatility; it must not be negative.
    pub fn new(volatility: Volatility) -> Result<Self> {
        cn_core::ensure!(volatility >= 0.0, "negative volatility ({volatility}) given");
        Ok(Self { volatility })
    }

    /// The constant volatility.
    pub fn level(&self) -> Volatility {
        self.volatility
    }
}

impl TermStructure for ConstantSwaptionVolatility {}

impl SwaptionVolatilityStructure for ConstantSwaptionVolatility {
    fn volatility_impl(&self, _option_time: Time, _swap_length: Time, _strike: Real) -> Volatility {
        self.volatility
    }
}

// ── InterpolatedSmileVolatility ───────────────────────────────────────────────

/// Swaption smile given by volatility quotes across strikes, shared by all
/// option times and swap lengths.
///
/// Quotes are joined by a natural cubic spline and extrapolated flat beyond
/// the outermost strikes.
#[derive(Debug, Clone)]
pub struct InterpolatedSmileVolatility {
    strikes: Vec<Real>,
    volatilities: Vec<Volatility>,
    spline: PiecewiseCubic,
}

impl InterpolatedSmileVolatility {
    /// Build the smile from strictly increasing strikes and non-negative
    /// volatility quotes.
    pub fn new(strikes: Vec<Real>, volatilities: Vec<Volatility>) -> Result<Self> {
        cn_core::ensure!(
            strikes.windows(2).all(|w| w[1] > w[0]),
            "strikes must be strictly increasing"
        );
        cn_core::ensure!(
            volatilities.iter().all(|&v| v >= 0.0),
            "volatility quotes must be non-negative"
        );
        let spline = PiecewiseCubic::build(
            &strikes,
            &volatilities,
            DerivativeApprox::Spline,
            false,
            NATURAL,
            NATURAL,
        )?;
        Ok(Self {
            strikes,
            volatilities,
            spline,
        })
    }

    /// Quoted strikes.
    pub fn strikes(&self) -> &[Real] {
        &self.strikes
    }

    /// Quoted volatilities.
    pub fn volatilities(&self) -> &[Volatility] {
        &self.volatilities
    }
}

impl TermStructure for InterpolatedSmileVolatility {}

impl SwaptionVolatilityStructure for InterpolatedSmileVolatility {
    fn volatility_impl(&self, _option_time: Time, _swap_length: Time, strike: Real) -> Volatility {
        let n = self.strikes.len();
        let k = strike.clamp(self.strikes[0], self.strikes[n - 1]);
        // a spline can undershoot between quotes
        self.spline
            .value(&self.strikes, &self.volatilities, k)
            .max(0.0)
    }
}
