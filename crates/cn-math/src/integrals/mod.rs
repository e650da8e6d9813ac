//! Numerical integration (translates `ql/math/integrals/`).
//!
//! Provides the two Gauss-Kronrod rules used by the CMS pricers: the
//! QUADPACK `qng` non-adaptive 10/21/43/87-point rule and the recursive
//! G7/K15 adaptive rule.

pub mod kronrod;

pub use kronrod::{GaussKronrodAdaptive, GaussKronrodNonAdaptive};

use std::cell::Cell;

use cn_core::{errors::Result, Real};

/// A numerical integrator.
///
/// Corresponds to the abstract `QuantLib::Integrator` class. Implementors
/// provide [`Integrator::integrate_ordered`] for `a < b`; the provided
/// methods handle empty and reversed intervals and reset the bookkeeping.
pub trait Integrator {
    /// Target absolute accuracy.
    fn absolute_accuracy(&self) -> Real;

    /// Evaluation budget.
    fn max_evaluations(&self) -> usize;

    /// Error estimate of the last integration.
    fn absolute_error(&self) -> Real;

    /// Function evaluations used by the last integration.
    fn number_of_evaluations(&self) -> usize;

    /// Clear the error estimate and evaluation count.
    fn reset(&self);

    /// Integrate a fallible `f` on `[a, b]` with `a < b`.
    fn integrate_ordered<F>(&self, f: &F, a: Real, b: Real) -> Result<Real>
    where
        F: Fn(Real) -> Result<Real>;

    /// Integrate a fallible `f` on `[a, b]`; the first error returned by `f`
    /// aborts the integration.
    fn try_integrate<F>(&self, f: F, a: Real, b: Real) -> Result<Real>
    where
        F: Fn(Real) -> Result<Real>,
    {
        self.reset();
        if a == b {
            Ok(0.0)
        } else if b > a {
            self.integrate_ordered(&f, a, b)
        } else {
            Ok(-self.integrate_ordered(&f, b, a)?)
        }
    }

    /// Integrate `f` on `[a, b]`.
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real> {
        self.try_integrate(|x| Ok(f(x)), a, b)
    }

    /// Whether the last integration stayed within budget and accuracy.
    fn integration_success(&self) -> bool {
        self.number_of_evaluations() <= self.max_evaluations()
            && self.absolute_error() <= self.absolute_accuracy()
    }
}

/// Bookkeeping shared by the integrators.
#[derive(Debug, Clone, Default)]
pub(crate) struct IntegrationRecord {
    absolute_error: Cell<Real>,
    evaluations: Cell<usize>,
}

impl IntegrationRecord {
    pub(crate) fn reset(&self) {
        self.absolute_error.set(0.0);
        self.evaluations.set(0);
    }

    pub(crate) fn absolute_error(&self) -> Real {
        self.absolute_error.get()
    }

    pub(crate) fn set_absolute_error(&self, err: Real) {
        self.absolute_error.set(err);
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    pub(crate) fn set_evaluations(&self, n: usize) {
        self.evaluations.set(n);
    }

    pub(crate) fn add_evaluations(&self, n: usize) {
        self.evaluations.set(self.evaluations.get() + n);
    }
}
