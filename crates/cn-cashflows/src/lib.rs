//! # cn-cashflows
//!
//! Constant-maturity-swap coupons and the Hagan "convexity conundrum"
//! pricers.
//!
//! ## Pricers
//!
//! - [`NumericHaganPricer`] — static replication with swaptions, integrated
//!   with Gauss-Kronrod rules
//! - [`AnalyticHaganPricer`] — closed form for a linearised `G` function
//!
//! Both read Black variances from a
//! [`SwaptionVolatilityStructure`](cn_termstructures::SwaptionVolatilityStructure)
//! and price through the yield-curve model chosen by [`YieldCurveModel`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `CmsCoupon` and the schedule of its underlying swap.
pub mod cms_coupon;

/// Replication integrand of the numeric pricer.
pub mod conundrum_integrand;

/// `G` functions mapping the swap rate to the payment-time zero bond.
pub mod g_function;

/// Numeric and analytic Hagan pricers.
pub mod hagan_pricer;

/// Vanilla swaption pricers.
pub mod vanilla_option_pricer;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use cms_coupon::{CmsCoupon, SwapSchedule};
pub use conundrum_integrand::ConundrumIntegrand;
pub use g_function::{
    g_function, GFunction, GFunctionExactYield, GFunctionStandard, GFunctionWithShifts,
    YieldCurveModel,
};
pub use hagan_pricer::{
    AnalyticHaganPricer, HaganPricer, HaganState, NumericHaganPricer, NumericHaganSettings,
};
pub use vanilla_option_pricer::{BlackVanillaOptionPricer, VanillaOptionPricer};
