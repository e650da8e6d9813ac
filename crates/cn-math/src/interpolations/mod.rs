//! 1D interpolation trait and implementations (translates
//! `ql/math/interpolation.hpp` and `ql/math/interpolations/`).

use cn_core::{
    errors::{Error, Result},
    Real,
};

pub mod convex_monotone;
pub mod cubic;
pub mod monotonicity;

pub use convex_monotone::{ConvexMonotone, ConvexMonotoneInterpolation, Section, SectionMap};
pub use cubic::{
    AkimaCubicInterpolation, BoundaryCondition, Cubic, CubicInterpolation, CubicNaturalSpline,
    CubicSplineOvershootingMinimization1, CubicSplineOvershootingMinimization2, DerivativeApprox,
    FritschButlandCubic, HarmonicCubic, KrugerCubic, MonotonicCubicNaturalSpline,
    MonotonicParabolic, Parabolic, PiecewiseCubic,
};
pub use monotonicity::hyman_filter;

/// A 1D interpolation function `f: R → R` defined by a set of known points.
///
/// Corresponds to `QuantLib::Interpolation`. Only `operator` and the
/// domain bounds are mandatory; the calculus helpers default to
/// [`Error::NotImplemented`] for schemes that do not provide them.
pub trait Interpolation1D: std::fmt::Debug {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }

    /// Integral of the interpolant from `x_min()` to `x`.
    fn primitive(&self, _x: Real) -> Result<Real> {
        Err(Error::NotImplemented(format!("primitive of {self:?}")))
    }

    /// First derivative at `x`.
    fn derivative(&self, _x: Real) -> Result<Real> {
        Err(Error::NotImplemented(format!("derivative of {self:?}")))
    }

    /// Second derivative at `x`.
    fn second_derivative(&self, _x: Real) -> Result<Real> {
        Err(Error::NotImplemented(format!("second derivative of {self:?}")))
    }
}

/// Binary search: find `i` such that `xs[i] <= x < xs[i+1]`, clamped to
/// `[0, n-2]` so that points outside the domain use the boundary segment.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    let n = xs.len();
    if x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Shared preconditions on a sample set.
pub(crate) fn check_samples(xs: &[Real], ys: &[Real], required: usize, what: &str) -> Result<()> {
    cn_core::ensure!(
        xs.len() == ys.len(),
        "xs and ys must have the same length ({} vs {})",
        xs.len(),
        ys.len()
    );
    if xs.len() < required {
        return Err(Error::InsufficientData {
            what: what.to_string(),
            required,
            given: xs.len(),
        });
    }
    cn_core::ensure!(
        xs.windows(2).all(|w| w[1] > w[0]),
        "{what}: xs must be strictly increasing"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_clamps_to_boundary_segments() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(locate(&xs, -5.0), 0);
        assert_eq!(locate(&xs, 0.0), 0);
        assert_eq!(locate(&xs, 0.5), 0);
        assert_eq!(locate(&xs, 1.0), 1);
        assert_eq!(locate(&xs, 2.999), 2);
        assert_eq!(locate(&xs, 3.0), 2);
        assert_eq!(locate(&xs, 10.0), 2);
    }

    #[test]
    fn check_samples_reports_counts() {
        let err = check_samples(&[0.0], &[1.0], 2, "cubic interpolation").unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientData {
                what: "cubic interpolation".into(),
                required: 2,
                given: 1
            }
        );
        assert!(matches!(
            check_samples(&[0.0, 1.0], &[1.0], 2, "cubic interpolation"),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn check_samples_rejects_repeated_and_unsorted_abscissas() {
        let ys = [0.0, 1.0, 0.0, 1.0];
        for xs in [[0.0, 1.0, 1.0, 3.0], [0.0, 2.0, 1.0, 3.0]] {
            assert!(matches!(
                check_samples(&xs, &ys, 2, "cubic interpolation"),
                Err(Error::Precondition(_))
            ));
        }
        assert!(check_samples(&[0.0, 1.0, 2.5, 3.0], &ys, 2, "cubic interpolation").is_ok());
    }
}
