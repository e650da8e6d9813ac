//! # conundrum
//!
//! Shape-preserving interpolation and CMS convexity pricing.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `cn-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use conundrum::cashflows::{
//!     AnalyticHaganPricer, CmsCoupon, SwapSchedule, YieldCurveModel,
//! };
//! use conundrum::termstructures::{ConstantSwaptionVolatility, FlatForward};
//!
//! let curve = Arc::new(FlatForward::new(0.04));
//! let swap = SwapSchedule::regular(5.0, 10.0, 2).unwrap();
//! let coupon = CmsCoupon::new(curve, swap, 5.0, 5.5, 0.5);
//!
//! let volatility = Arc::new(ConstantSwaptionVolatility::new(0.15).unwrap());
//! let mut pricer = AnalyticHaganPricer::new(volatility, YieldCurveModel::Standard, 0.0);
//! let rate = coupon.rate(&mut pricer).unwrap();
//! assert!(rate > coupon.swap_rate().unwrap());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use cn_core as core;

/// Interpolation, quadrature, root finding and the normal distribution.
pub use cn_math as math;

/// Yield curves and swaption volatility structures.
pub use cn_termstructures as termstructures;

/// Black formula.
pub use cn_pricingengines as pricingengines;

/// CMS coupons and Hagan pricers.
pub use cn_cashflows as cashflows;

pub use cn_core::{Error, Result};
