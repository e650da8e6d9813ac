//! # cn-termstructures
//!
//! Time-indexed yield curves (flat and Hagan-West convex-monotone) and the
//! swaption volatility structures consumed by the CMS pricers.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure` — base trait for all term structures.
pub mod term_structure;

/// `YieldTermStructure` — yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward` — constant forward-rate yield curve.
pub mod flat_forward;

/// `ConvexMonotoneForwardCurve` — Hagan-West forward-interpolated yield curve.
pub mod convex_monotone_forward_curve;

/// `SwaptionVolatilityStructure` with constant and smile implementations.
pub mod swaption_volatility;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use convex_monotone_forward_curve::ConvexMonotoneForwardCurve;
pub use flat_forward::FlatForward;
pub use swaption_volatility::{
    ConstantSwaptionVolatility, InterpolatedSmileVolatility, SwaptionVolatilityStructure,
};
pub use term_structure::TermStructure;
pub use yield_term_structure::YieldTermStructure;
