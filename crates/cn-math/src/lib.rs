//! # cn-math
//!
//! Numerical building blocks for conundrum-rs: the cubic and Hagan-West
//! convex-monotone interpolation engines, Gauss-Kronrod integrators,
//! Newton root finders, the tridiagonal operator behind spline fitting and
//! the normal distribution (via statrs).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// 1D interpolation schemes.
pub mod interpolations;

/// 1D root-finding solvers.
pub mod solvers1d;

/// Tridiagonal operator and solver.
pub mod tridiagonal;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::{close, close_enough};
pub use distributions::{normal_cdf, normal_pdf};
pub use integrals::{GaussKronrodAdaptive, GaussKronrodNonAdaptive, Integrator};
pub use interpolations::{ConvexMonotone, Cubic, Interpolation1D};
pub use solvers1d::{Newton, NewtonSafe};
pub use tridiagonal::TridiagonalOperator;
