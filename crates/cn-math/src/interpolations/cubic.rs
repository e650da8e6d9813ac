//! Cubic interpolation engine
//! (translates `ql/math/interpolations/cubicinterpolation.hpp`).
//!
//! A [`PiecewiseCubic`] is built from samples `(x_i, y_i)` by estimating the
//! first derivative `m_i` at every knot and turning the estimates into
//! per-segment coefficients
//!
//!   `f(x) = y_i + a_i·dx + b_i·dx² + c_i·dx³`,  `dx = x - x_i`.
//!
//! The derivative estimates come from one of the [`DerivativeApprox`]
//! schemes:
//!
//! - **Spline** — global C² spline, tridiagonal solve with the selected
//!   [`BoundaryCondition`]s.
//! - **SplineOM1 / SplineOM2** — splines minimising the overshoot measured
//!   on the first / second derivative (dense constrained least squares).
//! - **Parabolic, FritschButland, Akima, Kruger, Harmonic** — local
//!   three-point stencils.
//!
//! The Hyman filter ([`hyman_filter`](super::monotonicity::hyman_filter))
//! can be applied on top of any scheme.

use cn_core::{
    errors::{Error, Result},
    Real,
};
use nalgebra::{DMatrix, DVector};

use super::{check_samples, locate, monotonicity::hyman_filter, Interpolation1D};
use crate::tridiagonal::TridiagonalOperator;

// ── Configuration enums ───────────────────────────────────────────────────────

/// Algorithm used to estimate the first derivative at each knot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DerivativeApprox {
    /// Spline approximation (non-local, non-monotonic, linear). C².
    Spline,
    /// Overshooting minimisation, first derivative.
    SplineOM1,
    /// Overshooting minimisation, second derivative.
    SplineOM2,
    /// Fourth-order approximation (local, non-monotonic, linear).
    FourthOrder,
    /// Parabolic approximation (local, non-monotonic, linear).
    Parabolic,
    /// Modified parabolic approximation.
    ModifiedParabolic,
    /// Fritsch-Butland approximation (local, monotonic, non-linear).
    FritschButland,
    /// Akima approximation (local, non-monotonic, non-linear).
    Akima,
    /// Kruger approximation (local, monotonic, non-linear).
    Kruger,
    /// Weighted harmonic mean approximation (local, monotonic, non-linear).
    Harmonic,
}

/// End condition at the first or last knot.
///
/// Only the [`DerivativeApprox::Spline`] scheme looks at the boundary
/// conditions; local schemes use one-sided stencils at the ends.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryCondition {
    /// Make the second(-last) point an inactive knot.
    NotAKnot,
    /// Match the given first derivative at the end.
    FirstDerivative(Real),
    /// Match the given second derivative at the end.
    SecondDerivative(Real),
    /// Match first and second derivative at either end. Not implemented.
    Periodic,
    /// Match the end derivative of the cubic through the four outermost
    /// points.
    Lagrange,
}

/// Natural end condition: zero second derivative.
pub const NATURAL: BoundaryCondition = BoundaryCondition::SecondDerivative(0.0);

// ── PiecewiseCubic ────────────────────────────────────────────────────────────

/// Coefficients of a piecewise cubic over `n` knots (`n - 1` segments).
///
/// The sample arrays are not stored; every evaluation method takes them as
/// arguments so the same coefficients can back a borrowing view
/// ([`CubicInterpolation`]) or an owning term structure.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseCubic {
    primitive_constants: Vec<Real>,
    a: Vec<Real>,
    b: Vec<Real>,
    c: Vec<Real>,
    monotonicity_adjustments: Vec<bool>,
}

impl PiecewiseCubic {
    /// Build the cubic through `(xs, ys)`.
    ///
    /// # Errors
    /// - [`Error::Precondition`] when `xs` and `ys` differ in length or `xs`
    ///   is not strictly increasing.
    /// - [`Error::InsufficientData`] when there are too few points for the
    ///   scheme or boundary condition (2 in general, 3 for `NotAKnot` and the
    ///   overshooting-minimisation splines, 4 for `Lagrange` and `Akima`).
    /// - [`Error::NotImplemented`] for `Periodic`, `FourthOrder` and
    ///   `ModifiedParabolic`.
    pub fn build(
        xs: &[Real],
        ys: &[Real],
        scheme: DerivativeApprox,
        monotonic: bool,
        left: BoundaryCondition,
        right: BoundaryCondition,
    ) -> Result<Self> {
        check_samples(xs, ys, 2, "cubic interpolation")?;
        if left == BoundaryCondition::Lagrange || right == BoundaryCondition::Lagrange {
            check_samples(xs, ys, 4, "Lagrange boundary condition")?;
        }
        let n = xs.len();

        let dx: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let s: Vec<Real> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / dx[i]).collect();

        let mut m = match scheme {
            DerivativeApprox::Spline => spline_derivatives(xs, ys, &dx, &s, left, right)?,
            DerivativeApprox::SplineOM1 | DerivativeApprox::SplineOM2 => {
                check_samples(xs, ys, 3, "overshooting minimization spline")?;
                overshooting_minimization(ys, &dx, scheme == DerivativeApprox::SplineOM1)?
            }
            _ => local_derivatives(scheme, &dx, &s)?,
        };

        let monotonicity_adjustments = if monotonic {
            hyman_filter(&mut m, &s, &dx)
        } else {
            vec![false; n]
        };

        let mut a = Vec::with_capacity(n - 1);
        let mut b = Vec::with_capacity(n - 1);
        let mut c = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            a.push(m[i]);
            b.push((3.0 * s[i] - m[i + 1] - 2.0 * m[i]) / dx[i]);
            c.push((m[i + 1] + m[i] - 2.0 * s[i]) / (dx[i] * dx[i]));
        }

        let mut primitive_constants = vec![0.0; n - 1];
        for i in 1..n - 1 {
            let h = dx[i - 1];
            primitive_constants[i] = primitive_constants[i - 1]
                + h * (ys[i - 1] + h * (a[i - 1] / 2.0 + h * (b[i - 1] / 3.0 + h * c[i - 1] / 4.0)));
        }

        #[cfg(feature = "logging")]
        tracing::debug!(
            ?scheme,
            points = n,
            monotonic,
            adjustments = monotonicity_adjustments.iter().filter(|&&f| f).count(),
            "cubic interpolation built"
        );

        Ok(Self {
            primitive_constants,
            a,
            b,
            c,
            monotonicity_adjustments,
        })
    }

    /// Value at `x`; outside the domain the boundary polynomial is extended.
    pub fn value(&self, xs: &[Real], ys: &[Real], x: Real) -> Real {
        let j = locate(xs, x);
        let dx = x - xs[j];
        ys[j] + dx * (self.a[j] + dx * (self.b[j] + dx * self.c[j]))
    }

    /// Integral from `xs[0]` to `x`.
    pub fn primitive(&self, xs: &[Real], ys: &[Real], x: Real) -> Real {
        let j = locate(xs, x);
        let dx = x - xs[j];
        self.primitive_constants[j]
            + dx * (ys[j] + dx * (self.a[j] / 2.0 + dx * (self.b[j] / 3.0 + dx * self.c[j] / 4.0)))
    }

    /// First derivative at `x`.
    pub fn derivative(&self, xs: &[Real], x: Real) -> Real {
        let j = locate(xs, x);
        let dx = x - xs[j];
        self.a[j] + (2.0 * self.b[j] + 3.0 * self.c[j] * dx) * dx
    }

    /// Second derivative at `x`.
    pub fn second_derivative(&self, xs: &[Real], x: Real) -> Real {
        let j = locate(xs, x);
        let dx = x - xs[j];
        2.0 * self.b[j] + 6.0 * self.c[j] * dx
    }

    /// Primitive at the left end of each segment.
    pub fn primitive_constants(&self) -> &[Real] {
        &self.primitive_constants
    }

    /// Linear coefficients (the derivative estimate at each segment start).
    pub fn a_coefficients(&self) -> &[Real] {
        &self.a
    }

    /// Quadratic coefficients.
    pub fn b_coefficients(&self) -> &[Real] {
        &self.b
    }

    /// Cubic coefficients.
    pub fn c_coefficients(&self) -> &[Real] {
        &self.c
    }

    /// One flag per knot, set where the Hyman filter changed the estimate.
    pub fn monotonicity_adjustments(&self) -> &[bool] {
        &self.monotonicity_adjustments
    }
}

// ── Derivative schemes ────────────────────────────────────────────────────────

/// Largest residual of the spline system accepted, relative to the rhs.
const SPLINE_RESIDUAL_TOLERANCE: Real = 1.0e-8;

fn spline_derivatives(
    xs: &[Real],
    ys: &[Real],
    dx: &[Real],
    s: &[Real],
    left: BoundaryCondition,
    right: BoundaryCondition,
) -> Result<Vec<Real>> {
    let n = xs.len();
    if left == BoundaryCondition::NotAKnot || right == BoundaryCondition::NotAKnot {
        check_samples(xs, ys, 3, "not-a-knot boundary condition")?;
    }

    let mut op = TridiagonalOperator::new(n);
    let mut rhs = vec![0.0; n];
    for i in 1..n - 1 {
        op.set_mid_row(i, dx[i], 2.0 * (dx[i] + dx[i - 1]), dx[i - 1]);
        rhs[i] = 3.0 * (dx[i] * s[i - 1] + dx[i - 1] * s[i]);
    }

    match left {
        BoundaryCondition::NotAKnot => {
            op.set_first_row(dx[1] * (dx[1] + dx[0]), (dx[0] + dx[1]) * (dx[0] + dx[1]));
            rhs[0] = s[0] * dx[1] * (2.0 * dx[1] + 3.0 * dx[0]) + s[1] * dx[0] * dx[0];
        }
        BoundaryCondition::FirstDerivative(value) => {
            op.set_first_row(1.0, 0.0);
            rhs[0] = value;
        }
        BoundaryCondition::SecondDerivative(value) => {
            op.set_first_row(2.0, 1.0);
            rhs[0] = 3.0 * s[0] - value * dx[0] / 2.0;
        }
        BoundaryCondition::Periodic => {
            return Err(Error::NotImplemented("Periodic boundary condition".into()))
        }
        BoundaryCondition::Lagrange => {
            op.set_first_row(1.0, 0.0);
            rhs[0] = cubic_interpolating_polynomial_derivative(
                [xs[0], xs[1], xs[2], xs[3]],
                [ys[0], ys[1], ys[2], ys[3]],
                xs[0],
            );
        }
    }

    match right {
        BoundaryCondition::NotAKnot => {
            let (h1, h2) = (dx[n - 3], dx[n - 2]);
            op.set_last_row(-(h2 + h1) * (h2 + h1), -h1 * (h1 + h2));
            rhs[n - 1] = -s[n - 3] * h2 * h2 - s[n - 2] * h1 * (3.0 * h2 + 2.0 * h1);
        }
        BoundaryCondition::FirstDerivative(value) => {
            op.set_last_row(0.0, 1.0);
            rhs[n - 1] = value;
        }
        BoundaryCondition::SecondDerivative(value) => {
            op.set_last_row(1.0, 2.0);
            rhs[n - 1] = 3.0 * s[n - 2] + value * dx[n - 2] / 2.0;
        }
        BoundaryCondition::Periodic => {
            return Err(Error::NotImplemented("Periodic boundary condition".into()))
        }
        BoundaryCondition::Lagrange => {
            op.set_last_row(0.0, 1.0);
            rhs[n - 1] = cubic_interpolating_polynomial_derivative(
                [xs[n - 4], xs[n - 3], xs[n - 2], xs[n - 1]],
                [ys[n - 4], ys[n - 3], ys[n - 2], ys[n - 1]],
                xs[n - 1],
            );
        }
    }

    let m = op.solve_for(&rhs)?;
    let residual = op
        .apply(&m)?
        .iter()
        .zip(&rhs)
        .fold(0.0, |acc: Real, (lhs, r)| acc.max((lhs - r).abs()));
    let scale = rhs.iter().fold(1.0, |acc: Real, r| acc.max(r.abs()));
    cn_core::ensure_post!(
        residual <= SPLINE_RESIDUAL_TOLERANCE * scale,
        "spline system residual ({residual}) too large"
    );
    Ok(m)
}

/// Derivative at `x` of the cubic through the four points `(p_k, v_k)`.
fn cubic_interpolating_polynomial_derivative(p: [Real; 4], v: [Real; 4], x: Real) -> Real {
    let [a, b, c, d] = p;
    let [u, v, w, z] = v;
    (-((((a - c) * (b - c) * (c - x) * z - (a - d) * (b - d) * (d - x) * w) * (a - x + b - x)
        + ((a - c) * (b - c) * z - (a - d) * (b - d) * w) * (a - x) * (b - x))
        * (a - b)
        + ((a - c) * (a - d) * v - (b - c) * (b - d) * u) * (c - d) * (c - x) * (d - x)
        + ((a - c) * (a - d) * (a - x) * v - (b - c) * (b - d) * (b - x) * u)
            * (c - x + d - x)
            * (c - d)))
        / ((a - b) * (a - c) * (a - d) * (b - c) * (b - d) * (c - d))
}

/// Second-derivative values `D` of the overshoot-minimising spline, turned
/// into first-derivative estimates.
///
/// `first_order` selects the roughness measure on the first derivative
/// (`SplineOM1`), otherwise on the second (`SplineOM2`).
fn overshooting_minimization(ys: &[Real], dx: &[Real], first_order: bool) -> Result<Vec<Real>> {
    let n = ys.len();
    let singular = || Error::Runtime("singular matrix in overshooting minimization".into());

    let mut t = DMatrix::<Real>::zeros(n - 2, n);
    let mut s = DMatrix::<Real>::zeros(n - 2, n);
    for i in 0..n - 2 {
        t[(i, i)] = dx[i] / 6.0;
        t[(i, i + 1)] = (dx[i] + dx[i + 1]) / 3.0;
        t[(i, i + 2)] = dx[i + 1] / 6.0;
        s[(i, i)] = 1.0 / dx[i];
        s[(i, i + 1)] = -(1.0 / dx[i + 1] + 1.0 / dx[i]);
        s[(i, i + 2)] = 1.0 / dx[i + 1];
    }
    let mut up = DMatrix::<Real>::zeros(n, 2);
    up[(0, 0)] = 1.0;
    up[(n - 1, 1)] = 1.0;
    let mut us = DMatrix::<Real>::zeros(n, n - 2);
    for i in 0..n - 2 {
        us[(i + 1, i)] = 1.0;
    }

    let z = &us * (&t * &us).try_inverse().ok_or_else(singular)?;
    let identity = DMatrix::<Real>::identity(n, n);
    let v = (&identity - &z * &t) * &up;
    let w = &z * &s;

    // roughness weights per segment
    let scale = 1.0 / (n - 1) as Real;
    let (weight, off_diagonal): (Vec<Real>, Real) = if first_order {
        (dx.iter().map(|h| scale * h * h * h).collect(), 7.0 / 8.0)
    } else {
        (dx.iter().map(|h| scale * h).collect(), 0.5)
    };
    let mut q = DMatrix::<Real>::zeros(n, n);
    q[(0, 0)] = weight[0];
    q[(0, 1)] = off_diagonal * weight[0];
    for i in 1..n - 1 {
        q[(i, i - 1)] = off_diagonal * weight[i - 1];
        q[(i, i)] = weight[i] + weight[i - 1];
        q[(i, i + 1)] = off_diagonal * weight[i];
    }
    q[(n - 1, n - 2)] = off_diagonal * weight[n - 2];
    q[(n - 1, n - 1)] = weight[n - 2];

    let vt = v.transpose();
    let projection = (&vt * &q * &v).try_inverse().ok_or_else(singular)?;
    let j = (&identity - &v * projection * &vt * &q) * &w;
    let d = j * DVector::from_column_slice(ys);

    let mut m = vec![0.0; n];
    for i in 0..n - 1 {
        m[i] = (ys[i + 1] - ys[i]) / dx[i] - (2.0 * d[i] + d[i + 1]) * dx[i] / 6.0;
    }
    m[n - 1] = m[n - 2] + d[n - 2] * dx[n - 2] + (d[n - 1] - d[n - 2]) * dx[n - 2] / 2.0;
    Ok(m)
}

fn local_derivatives(scheme: DerivativeApprox, dx: &[Real], s: &[Real]) -> Result<Vec<Real>> {
    let n = dx.len() + 1;
    match scheme {
        DerivativeApprox::FourthOrder => {
            return Err(Error::NotImplemented("FourthOrder derivative approximation".into()))
        }
        DerivativeApprox::ModifiedParabolic => {
            return Err(Error::NotImplemented(
                "ModifiedParabolic derivative approximation".into(),
            ))
        }
        DerivativeApprox::Akima if n < 4 => {
            return Err(Error::InsufficientData {
                what: "Akima derivative approximation".into(),
                required: 4,
                given: n,
            })
        }
        _ => {}
    }
    if n == 2 {
        return Ok(vec![s[0], s[0]]);
    }

    let mut m = vec![0.0; n];
    match scheme {
        DerivativeApprox::Parabolic => {
            for i in 1..n - 1 {
                m[i] = (dx[i - 1] * s[i] + dx[i] * s[i - 1]) / (dx[i] + dx[i - 1]);
            }
            m[0] = parabolic_left(dx, s);
            m[n - 1] = parabolic_right(dx, s);
        }
        DerivativeApprox::FritschButland => {
            for i in 1..n - 1 {
                let s_min = s[i - 1].min(s[i]);
                let s_max = s[i - 1].max(s[i]);
                m[i] = if s_max + 2.0 * s_min == 0.0 {
                    if s_min * s_max < 0.0 {
                        Real::MIN
                    } else if s_min * s_max == 0.0 {
                        0.0
                    } else {
                        Real::MAX
                    }
                } else {
                    3.0 * s_min * s_max / (s_max + 2.0 * s_min)
                };
            }
            m[0] = parabolic_left(dx, s);
            m[n - 1] = parabolic_right(dx, s);
        }
        DerivativeApprox::Akima => akima(&mut m, s),
        DerivativeApprox::Kruger => {
            for i in 1..n - 1 {
                m[i] = if s[i - 1] * s[i] < 0.0 {
                    // slope changes sign at the knot
                    0.0
                } else {
                    2.0 / (1.0 / s[i - 1] + 1.0 / s[i])
                };
            }
            m[0] = (3.0 * s[0] - m[1]) / 2.0;
            m[n - 1] = (3.0 * s[n - 2] - m[n - 2]) / 2.0;
        }
        DerivativeApprox::Harmonic => {
            for i in 1..n - 1 {
                let w1 = 2.0 * dx[i] + dx[i - 1];
                let w2 = dx[i] + 2.0 * dx[i - 1];
                m[i] = if s[i - 1] * s[i] <= 0.0 {
                    0.0
                } else {
                    (w1 + w2) / (w1 / s[i - 1] + w2 / s[i])
                };
            }
            m[0] = parabolic_left(dx, s);
            if m[0] * s[0] < 0.0 {
                m[0] = 0.0;
            } else if s[0] * s[1] < 0.0 && m[0].abs() > (3.0 * s[0]).abs() {
                m[0] = 3.0 * s[0];
            }
            m[n - 1] = parabolic_right(dx, s);
            if m[n - 1] * s[n - 2] < 0.0 {
                m[n - 1] = 0.0;
            } else if s[n - 2] * s[n - 3] < 0.0 && m[n - 1].abs() > (3.0 * s[n - 2]).abs() {
                m[n - 1] = 3.0 * s[n - 2];
            }
        }
        DerivativeApprox::Spline
        | DerivativeApprox::SplineOM1
        | DerivativeApprox::SplineOM2
        | DerivativeApprox::FourthOrder
        | DerivativeApprox::ModifiedParabolic => {
            return Err(Error::InvalidArgument(format!(
                "{scheme:?} is not a local derivative approximation"
            )))
        }
    }
    Ok(m)
}

#[inline]
fn parabolic_left(dx: &[Real], s: &[Real]) -> Real {
    ((2.0 * dx[0] + dx[1]) * s[0] - dx[0] * s[1]) / (dx[0] + dx[1])
}

#[inline]
fn parabolic_right(dx: &[Real], s: &[Real]) -> Real {
    let n = dx.len() + 1;
    ((2.0 * dx[n - 2] + dx[n - 3]) * s[n - 2] - dx[n - 2] * s[n - 3]) / (dx[n - 2] + dx[n - 3])
}

fn akima(m: &mut [Real], s: &[Real]) {
    let n = m.len();
    m[0] = ((s[1] - s[0]).abs() * 2.0 * s[0] * s[1]
        + (2.0 * s[0] * s[1] - 4.0 * s[0] * s[0] * s[1]).abs() * s[0])
        / ((s[1] - s[0]).abs() + (2.0 * s[0] * s[1] - 4.0 * s[0] * s[0] * s[1]).abs());
    m[1] = ((s[2] - s[1]).abs() * s[0] + (s[0] - 2.0 * s[0] * s[1]).abs() * s[1])
        / ((s[2] - s[1]).abs() + (s[0] - 2.0 * s[0] * s[1]).abs());
    for i in 2..n - 2 {
        m[i] = if s[i - 2] == s[i - 1] && s[i] != s[i + 1] {
            s[i - 1]
        } else if s[i - 2] != s[i - 1] && s[i] == s[i + 1] {
            s[i]
        } else if s[i] == s[i - 1] {
            s[i]
        } else if s[i - 2] == s[i - 1] && s[i - 1] != s[i] && s[i] == s[i + 1] {
            (s[i - 1] + s[i]) / 2.0
        } else {
            ((s[i + 1] - s[i]).abs() * s[i - 1] + (s[i - 1] - s[i - 2]).abs() * s[i])
                / ((s[i + 1] - s[i]).abs() + (s[i - 1] - s[i - 2]).abs())
        };
    }
    let (sl, sp, spp) = (s[n - 2], s[n - 3], s[n - 4]);
    m[n - 2] = ((2.0 * sl * sp - sl).abs() * sp + (sp - spp).abs() * sl)
        / ((2.0 * sl * sp - sl).abs() + (sp - spp).abs());
    m[n - 1] = ((4.0 * sl * sl * sp - 2.0 * sl * sp).abs() * sl + (sl - sp).abs() * 2.0 * sl * sp)
        / ((4.0 * sl * sl * sp - 2.0 * sl * sp).abs() + (sl - sp).abs());
}

// ── CubicInterpolation ────────────────────────────────────────────────────────

/// Cubic interpolation over borrowed sample slices.
///
/// The view does not own the samples; it must not outlive them. Calling
/// [`update`](Self::update) recomputes the coefficients from the slices.
#[derive(Debug, Clone)]
pub struct CubicInterpolation<'a> {
    xs: &'a [Real],
    ys: &'a [Real],
    scheme: DerivativeApprox,
    monotonic: bool,
    left: BoundaryCondition,
    right: BoundaryCondition,
    cubic: PiecewiseCubic,
}

impl<'a> CubicInterpolation<'a> {
    /// Build a cubic interpolation; see [`PiecewiseCubic::build`] for the
    /// preconditions.
    pub fn new(
        xs: &'a [Real],
        ys: &'a [Real],
        scheme: DerivativeApprox,
        monotonic: bool,
        left: BoundaryCondition,
        right: BoundaryCondition,
    ) -> Result<Self> {
        let cubic = PiecewiseCubic::build(xs, ys, scheme, monotonic, left, right)?;
        Ok(Self {
            xs,
            ys,
            scheme,
            monotonic,
            left,
            right,
            cubic,
        })
    }

    /// Recompute the coefficients from the current samples.
    pub fn update(&mut self) -> Result<()> {
        self.cubic = PiecewiseCubic::build(
            self.xs,
            self.ys,
            self.scheme,
            self.monotonic,
            self.left,
            self.right,
        )?;
        Ok(())
    }

    /// The underlying coefficients.
    pub fn piecewise(&self) -> &PiecewiseCubic {
        &self.cubic
    }

    /// The derivative approximation scheme.
    pub fn scheme(&self) -> DerivativeApprox {
        self.scheme
    }

    /// See [`PiecewiseCubic::primitive_constants`].
    pub fn primitive_constants(&self) -> &[Real] {
        self.cubic.primitive_constants()
    }

    /// See [`PiecewiseCubic::a_coefficients`].
    pub fn a_coefficients(&self) -> &[Real] {
        self.cubic.a_coefficients()
    }

    /// See [`PiecewiseCubic::b_coefficients`].
    pub fn b_coefficients(&self) -> &[Real] {
        self.cubic.b_coefficients()
    }

    /// See [`PiecewiseCubic::c_coefficients`].
    pub fn c_coefficients(&self) -> &[Real] {
        self.cubic.c_coefficients()
    }

    /// See [`PiecewiseCubic::monotonicity_adjustments`].
    pub fn monotonicity_adjustments(&self) -> &[bool] {
        self.cubic.monotonicity_adjustments()
    }
}

impl Interpolation1D for CubicInterpolation<'_> {
    fn operator(&self, x: Real) -> Real {
        self.cubic.value(self.xs, self.ys, x)
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn primitive(&self, x: Real) -> Result<Real> {
        Ok(self.cubic.primitive(self.xs, self.ys, x))
    }

    fn derivative(&self, x: Real) -> Result<Real> {
        Ok(self.cubic.derivative(self.xs, x))
    }

    fn second_derivative(&self, x: Real) -> Result<Real> {
        Ok(self.cubic.second_derivative(self.xs, x))
    }
}

// ── Presets ───────────────────────────────────────────────────────────────────

macro_rules! cubic_preset {
    ($(#[$doc:meta])* $name:ident, $scheme:expr, $monotonic:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<'a>(CubicInterpolation<'a>);

        impl<'a> $name<'a> {
            /// Build the interpolation with natural end conditions.
            pub fn new(xs: &'a [Real], ys: &'a [Real]) -> Result<Self> {
                CubicInterpolation::new(xs, ys, $scheme, $monotonic, NATURAL, NATURAL).map(Self)
            }

            /// Unwrap into the general cubic interpolation.
            pub fn into_inner(self) -> CubicInterpolation<'a> {
                self.0
            }
        }

        impl<'a> std::ops::Deref for $name<'a> {
            type Target = CubicInterpolation<'a>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name<'_> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl Interpolation1D for $name<'_> {
            fn operator(&self, x: Real) -> Real {
                self.0.operator(x)
            }
            fn x_min(&self) -> Real {
                self.0.x_min()
            }
            fn x_max(&self) -> Real {
                self.0.x_max()
            }
            fn primitive(&self, x: Real) -> Result<Real> {
                self.0.primitive(x)
            }
            fn derivative(&self, x: Real) -> Result<Real> {
                self.0.derivative(x)
            }
            fn second_derivative(&self, x: Real) -> Result<Real> {
                self.0.second_derivative(x)
            }
        }
    };
}

cubic_preset!(
    /// Natural cubic spline (zero second derivative at both ends).
    CubicNaturalSpline,
    DerivativeApprox::Spline,
    false
);
cubic_preset!(
    /// Natural cubic spline with the Hyman filter.
    MonotonicCubicNaturalSpline,
    DerivativeApprox::Spline,
    true
);
cubic_preset!(
    /// Spline minimising overshoot on the first derivative.
    CubicSplineOvershootingMinimization1,
    DerivativeApprox::SplineOM1,
    false
);
cubic_preset!(
    /// Spline minimising overshoot on the second derivative.
    CubicSplineOvershootingMinimization2,
    DerivativeApprox::SplineOM2,
    false
);
cubic_preset!(
    /// Akima cubic interpolation.
    AkimaCubicInterpolation,
    DerivativeApprox::Akima,
    false
);
cubic_preset!(
    /// Kruger cubic interpolation.
    KrugerCubic,
    DerivativeApprox::Kruger,
    false
);
cubic_preset!(
    /// Weighted harmonic mean cubic interpolation.
    HarmonicCubic,
    DerivativeApprox::Harmonic,
    false
);
cubic_preset!(
    /// Fritsch-Butland cubic interpolation, Hyman-filtered.
    FritschButlandCubic,
    DerivativeApprox::FritschButland,
    true
);
cubic_preset!(
    /// Parabolic cubic interpolation.
    Parabolic,
    DerivativeApprox::Parabolic,
    false
);
cubic_preset!(
    /// Parabolic cubic interpolation with the Hyman filter.
    MonotonicParabolic,
    DerivativeApprox::Parabolic,
    true
);

// ── Factory ───────────────────────────────────────────────────────────────────

/// Cubic interpolation factory.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cubic {
    /// Derivative approximation scheme.
    pub scheme: DerivativeApprox,
    /// Apply the Hyman filter.
    pub monotonic: bool,
    /// Left end condition.
    pub left: BoundaryCondition,
    /// Right end condition.
    pub right: BoundaryCondition,
}

impl Default for Cubic {
    fn default() -> Self {
        Self {
            scheme: DerivativeApprox::Kruger,
            monotonic: false,
            left: NATURAL,
            right: NATURAL,
        }
    }
}

impl Cubic {
    /// Whether the scheme is global (a data change moves every segment).
    pub const GLOBAL: bool = true;
    /// Minimum number of points.
    pub const REQUIRED_POINTS: usize = 2;

    /// Build an interpolation over `xs`, `ys` with these settings.
    pub fn interpolate<'a>(&self, xs: &'a [Real], ys: &'a [Real]) -> Result<CubicInterpolation<'a>> {
        CubicInterpolation::new(xs, ys, self.scheme, self.monotonic, self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cubic(x: Real) -> Real {
        x * x * x - 2.0 * x * x + 0.5 * x + 1.0
    }

    #[test]
    fn kruger_sign_change_gives_flat_knot() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 0.0, 1.0];
        let interp = KrugerCubic::new(&xs, &ys).unwrap();
        assert_eq!(interp.a_coefficients()[1], 0.0);
        assert_eq!(interp.a_coefficients()[2], 0.0);
        // ends: (3 S - m_inner) / 2
        assert_abs_diff_eq!(interp.a_coefficients()[0], 1.5, epsilon = 1e-15);
    }

    #[test]
    fn repeated_or_unsorted_abscissas_are_rejected() {
        let ys = [0.0, 1.0, 0.0, 1.0];
        for xs in [[0.0, 1.0, 1.0, 3.0], [0.0, 2.0, 1.0, 3.0]] {
            for scheme in [DerivativeApprox::Spline, DerivativeApprox::Kruger] {
                assert!(matches!(
                    CubicInterpolation::new(&xs, &ys, scheme, false, NATURAL, NATURAL),
                    Err(Error::Precondition(_))
                ));
            }
        }
    }

    #[test]
    fn spline_solution_satisfies_its_system() {
        let xs = [0.0, 0.3, 1.0, 1.1, 4.0];
        let ys = [1.0, -2.0, 5.0, 4.5, 0.0];
        for (left, right) in [
            (NATURAL, NATURAL),
            (BoundaryCondition::NotAKnot, BoundaryCondition::NotAKnot),
            (BoundaryCondition::FirstDerivative(3.0), BoundaryCondition::Lagrange),
        ] {
            let interp =
                CubicInterpolation::new(&xs, &ys, DerivativeApprox::Spline, false, left, right)
                    .unwrap();
            // C2 at the interior knots
            for &x in &xs[1..4] {
                assert_abs_diff_eq!(
                    interp.second_derivative(x - 1e-12).unwrap(),
                    interp.second_derivative(x + 1e-12).unwrap(),
                    epsilon = 1e-5
                );
            }
        }
    }

    #[test]
    fn natural_spline_has_zero_end_curvature() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 0.0];
        let interp = CubicNaturalSpline::new(&xs, &ys).unwrap();
        assert_abs_diff_eq!(interp.second_derivative(0.0).unwrap(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(interp.second_derivative(2.0).unwrap(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(interp.operator(1.0), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn clamped_and_lagrange_splines_reproduce_a_cubic() {
        let xs = [0.0, 0.5, 1.2, 2.0, 2.5, 3.5];
        let ys: Vec<Real> = xs.iter().map(|&x| cubic(x)).collect();
        let d = |x: Real| 3.0 * x * x - 4.0 * x + 0.5;
        let dd = |x: Real| 6.0 * x - 4.0;

        let conditions = [
            (
                BoundaryCondition::FirstDerivative(d(0.0)),
                BoundaryCondition::FirstDerivative(d(3.5)),
            ),
            (
                BoundaryCondition::SecondDerivative(dd(0.0)),
                BoundaryCondition::SecondDerivative(dd(3.5)),
            ),
            (BoundaryCondition::Lagrange, BoundaryCondition::Lagrange),
            (BoundaryCondition::NotAKnot, BoundaryCondition::NotAKnot),
        ];
        for (left, right) in conditions {
            let interp =
                CubicInterpolation::new(&xs, &ys, DerivativeApprox::Spline, false, left, right)
                    .unwrap();
            for k in 0..=35 {
                let x = k as Real * 0.1;
                let v = interp.operator(x);
                assert!(
                    (v - cubic(x)).abs() < 1e-10,
                    "{left:?}/{right:?} at x={x}: expected {}, got {v}",
                    cubic(x)
                );
            }
        }
    }

    #[test]
    fn primitive_matches_exact_integral_for_reproduced_cubic() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys: Vec<Real> = xs.iter().map(|&x| cubic(x)).collect();
        let interp = CubicInterpolation::new(
            &xs,
            &ys,
            DerivativeApprox::Spline,
            false,
            BoundaryCondition::Lagrange,
            BoundaryCondition::Lagrange,
        )
        .unwrap();
        let exact = |x: Real| x.powi(4) / 4.0 - 2.0 * x.powi(3) / 3.0 + 0.25 * x * x + x;
        for &x in &[0.3, 1.0, 1.7, 2.9, 3.0] {
            assert_abs_diff_eq!(interp.primitive(x).unwrap(), exact(x), epsilon = 1e-10);
        }
    }

    #[test]
    fn two_points_local_scheme_is_linear() {
        let xs = [1.0, 3.0];
        let ys = [2.0, 6.0];
        let interp = Parabolic::new(&xs, &ys).unwrap();
        assert_eq!(interp.a_coefficients(), &[2.0]);
        assert_abs_diff_eq!(interp.operator(2.0), 4.0, epsilon = 1e-15);
    }

    #[test]
    fn fritsch_butland_zero_denominator_sentinel() {
        // S = [1, -0.5]: Smax + 2 Smin == 0 and Smin * Smax < 0
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 0.5];
        let raw = CubicInterpolation::new(
            &xs,
            &ys,
            DerivativeApprox::FritschButland,
            false,
            NATURAL,
            NATURAL,
        )
        .unwrap();
        assert_eq!(raw.a_coefficients()[1], Real::MIN);

        // the Hyman filter flattens the peak
        let filtered = FritschButlandCubic::new(&xs, &ys).unwrap();
        assert_eq!(filtered.a_coefficients()[1], 0.0);
        assert!(filtered.monotonicity_adjustments()[1]);
    }

    #[test]
    fn harmonic_end_clamp() {
        // S = [1, -1, -1]: parabolic end estimate 2 is within 3|S0|, kept
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 0.0, -1.0];
        let interp = HarmonicCubic::new(&xs, &ys).unwrap();
        assert_abs_diff_eq!(interp.a_coefficients()[0], 2.0, epsilon = 1e-15);
        assert_eq!(interp.a_coefficients()[1], 0.0);
    }

    #[test]
    fn unimplemented_features_fail() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 4.0, 9.0];
        let periodic = CubicInterpolation::new(
            &xs,
            &ys,
            DerivativeApprox::Spline,
            false,
            BoundaryCondition::Periodic,
            NATURAL,
        );
        assert!(matches!(periodic, Err(Error::NotImplemented(_))));
        for scheme in [DerivativeApprox::FourthOrder, DerivativeApprox::ModifiedParabolic] {
            let r = CubicInterpolation::new(&xs, &ys, scheme, false, NATURAL, NATURAL);
            assert!(matches!(r, Err(Error::NotImplemented(_))), "{scheme:?}");
        }
    }

    #[test]
    fn too_few_points_are_rejected() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 4.0];
        let lagrange = CubicInterpolation::new(
            &xs,
            &ys,
            DerivativeApprox::Spline,
            false,
            BoundaryCondition::Lagrange,
            NATURAL,
        );
        assert_eq!(
            lagrange.unwrap_err().to_string(),
            "Lagrange boundary condition requires at least 4 points (3 are given)"
        );
        assert!(matches!(
            AkimaCubicInterpolation::new(&xs, &ys),
            Err(Error::InsufficientData { required: 4, .. })
        ));
        assert!(CubicNaturalSpline::new(&xs[..1], &ys[..1]).is_err());
    }

    #[test]
    fn overshooting_minimization_interpolates() {
        let xs = [0.0, 1.0, 2.5, 3.0, 4.0];
        let ys = [1.0, 2.0, 1.5, 3.0, 2.0];
        let om1 = CubicSplineOvershootingMinimization1::new(&xs, &ys).unwrap();
        let om2 = CubicSplineOvershootingMinimization2::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(om1.operator(*x), *y, epsilon = 1e-12);
            assert_abs_diff_eq!(om2.operator(*x), *y, epsilon = 1e-12);
        }
        // C² at interior knots: left segment curvature at its end equals
        // the right segment curvature at its start
        for interp in [&*om1, &*om2] {
            let (b, c) = (interp.b_coefficients(), interp.c_coefficients());
            for i in 1..xs.len() - 1 {
                let h = xs[i] - xs[i - 1];
                let left = 2.0 * b[i - 1] + 6.0 * c[i - 1] * h;
                let right = 2.0 * b[i];
                assert!((left - right).abs() < 1e-10, "knot {i}: {left} vs {right}");
            }
        }
    }

    #[test]
    fn factory_defaults_to_kruger() {
        let factory = Cubic::default();
        assert_eq!(factory.scheme, DerivativeApprox::Kruger);
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 0.0, 1.0];
        let interp = factory.interpolate(&xs, &ys).unwrap();
        assert_eq!(interp.scheme(), DerivativeApprox::Kruger);
        assert_eq!(interp.a_coefficients()[1], 0.0);
    }
}
