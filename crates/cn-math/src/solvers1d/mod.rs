//! 1D root finding (translates `ql/math/solvers1d/newton.hpp` and
//! `newtonsafe.hpp`).
//!
//! Both solvers take a closure returning `(f(x), f'(x))`. The root must be
//! bracketed by `[x_min, x_max]`; a bound where `f` is already close to zero
//! is returned directly.

use cn_core::{
    errors::{Error, Result},
    Real,
};

use crate::comparison::close;

/// Default evaluation budget.
pub const DEFAULT_MAX_EVALUATIONS: usize = 100;

/// Validated bracket with the function value at its lower bound.
struct Bracket {
    f_x_min: Real,
    accuracy: Real,
}

enum Start {
    /// One of the bounds is already a root.
    Root(Real),
    Bracketed(Bracket),
}

/// Validate the inputs and evaluate `f` at both bounds (two evaluations).
fn check_bracket<F>(
    f_df: &mut F,
    accuracy: Real,
    guess: Real,
    x_min: Real,
    x_max: Real,
) -> Result<Start>
where
    F: FnMut(Real) -> (Real, Real),
{
    cn_core::ensure!(accuracy > 0.0, "accuracy ({accuracy}) must be positive");
    cn_core::ensure!(
        x_min < x_max,
        "invalid range: xMin ({x_min}) >= xMax ({x_max})"
    );
    cn_core::ensure!(
        guess >= x_min && guess <= x_max,
        "guess ({guess}) outside the range [{x_min}, {x_max}]"
    );

    let (f_x_min, _) = f_df(x_min);
    if close(f_x_min, 0.0) {
        return Ok(Start::Root(x_min));
    }
    let (f_x_max, _) = f_df(x_max);
    if close(f_x_max, 0.0) {
        return Ok(Start::Root(x_max));
    }
    cn_core::ensure!(
        f_x_min * f_x_max < 0.0,
        "root not bracketed: f[{x_min},{x_max}] -> [{f_x_min:e},{f_x_max:e}]"
    );
    Ok(Start::Bracketed(Bracket {
        f_x_min,
        accuracy: accuracy.max(Real::EPSILON),
    }))
}

fn max_evaluations_exceeded(max_evaluations: usize) -> Error {
    Error::Convergence(format!(
        "maximum number of function evaluations ({max_evaluations}) exceeded"
    ))
}

// ── Newton ────────────────────────────────────────────────────────────────────

/// Newton-Raphson solver.
///
/// When an iterate leaves `[x_min, x_max]` the remaining budget is handed to
/// [`NewtonSafe`], restarting from the last iterate inside the bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Newton {
    max_evaluations: usize,
}

impl Default for Newton {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVALUATIONS)
    }
}

impl Newton {
    /// Create a solver with the given evaluation budget.
    pub fn new(max_evaluations: usize) -> Self {
        Self { max_evaluations }
    }

    /// Evaluation budget.
    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    /// Find a root of `f` starting from `guess`.
    pub fn solve<F>(
        &self,
        mut f_df: F,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real>
    where
        F: FnMut(Real) -> (Real, Real),
    {
        let bracket = match check_bracket(&mut f_df, accuracy, guess, x_min, x_max)? {
            Start::Root(root) => return Ok(root),
            Start::Bracketed(bracket) => bracket,
        };
        let mut evaluations = 2;
        let mut root = guess;
        let (mut froot, mut dfroot) = f_df(root);
        evaluations += 1;

        while evaluations <= self.max_evaluations {
            let dx = froot / dfroot;
            root -= dx;
            if (x_min - root) * (root - x_max) < 0.0 {
                // jumped out of the bracket
                return NewtonSafe::new(self.max_evaluations - evaluations).solve(
                    f_df,
                    bracket.accuracy,
                    root + dx,
                    x_min,
                    x_max,
                );
            }
            if dx.abs() < bracket.accuracy {
                return Ok(root);
            }
            (froot, dfroot) = f_df(root);
            evaluations += 1;
        }
        Err(max_evaluations_exceeded(self.max_evaluations))
    }
}

// ── NewtonSafe ────────────────────────────────────────────────────────────────

/// Newton-Raphson with bisection safeguard.
///
/// Takes a bisection step whenever the Newton step would leave the current
/// bracket or would not halve the previous step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewtonSafe {
    max_evaluations: usize,
}

impl Default for NewtonSafe {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVALUATIONS)
    }
}

impl NewtonSafe {
    /// Create a solver with the given evaluation budget.
    pub fn new(max_evaluations: usize) -> Self {
        Self { max_evaluations }
    }

    /// Find a root of `f` starting from `guess`.
    pub fn solve<F>(
        &self,
        mut f_df: F,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real>
    where
        F: FnMut(Real) -> (Real, Real),
    {
        let bracket = match check_bracket(&mut f_df, accuracy, guess, x_min, x_max)? {
            Start::Root(root) => return Ok(root),
            Start::Bracketed(bracket) => bracket,
        };

        // orient the search so that f(xl) < 0
        let (mut xl, mut xh) = if bracket.f_x_min < 0.0 {
            (x_min, x_max)
        } else {
            (x_max, x_min)
        };

        let mut dx_old = x_max - x_min;
        let mut dx = dx_old;
        let mut root = guess;
        let (mut froot, mut dfroot) = f_df(root);
        let mut evaluations = 3;

        while evaluations <= self.max_evaluations {
            let newton_out_of_range =
                ((root - xh) * dfroot - froot) * ((root - xl) * dfroot - froot) > 0.0;
            let too_slow = (2.0 * froot).abs() > (dx_old * dfroot).abs();
            dx_old = dx;
            if newton_out_of_range || too_slow {
                dx = (xh - xl) / 2.0;
                root = xl + dx;
            } else {
                dx = froot / dfroot;
                root -= dx;
            }
            if dx.abs() < bracket.accuracy {
                return Ok(root);
            }
            (froot, dfroot) = f_df(root);
            evaluations += 1;
            if froot < 0.0 {
                xl = root;
            } else {
                xh = root;
            }
        }
        Err(max_evaluations_exceeded(self.max_evaluations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cubic(x: Real) -> (Real, Real) {
        (x * x * x - 2.0 * x - 5.0, 3.0 * x * x - 2.0)
    }

    #[test]
    fn newton_finds_root() {
        let root = Newton::new(100).solve(cubic, 1e-12, 2.0, 0.0, 4.0).unwrap();
        assert_abs_diff_eq!(root, 2.094_551_481_542_326_6, epsilon = 1e-10);
    }

    #[test]
    fn newton_safe_finds_root() {
        let root = NewtonSafe::new(100)
            .solve(|x| (x.exp() - 2.0, x.exp()), 1e-12, 0.1, -1.0, 3.0)
            .unwrap();
        assert_abs_diff_eq!(root, 2.0_f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn newton_hands_over_when_leaving_the_bracket() {
        // from x = 3 the first Newton step on atan lands near -4.5
        let f = |x: Real| (x.atan() - 0.5, 1.0 / (1.0 + x * x));
        let root = Newton::new(100).solve(f, 1e-12, 3.0, -1.0, 3.0).unwrap();
        assert_abs_diff_eq!(root, 0.5_f64.tan(), epsilon = 1e-10);
    }

    #[test]
    fn root_at_a_bound_is_returned() {
        let root = Newton::default()
            .solve(|x| (x - 1.0, 1.0), 1e-12, 0.5, 0.0, 1.0)
            .unwrap();
        assert_eq!(root, 1.0);
    }

    #[test]
    fn unbracketed_root_is_rejected() {
        let r = Newton::default().solve(|x| (x * x + 1.0, 2.0 * x), 1e-12, 0.5, -1.0, 2.0);
        assert!(matches!(r, Err(Error::Precondition(_))));
    }

    #[test]
    fn budget_is_enforced() {
        let r = Newton::new(3).solve(cubic, 1e-15, 3.9, 0.0, 4.0);
        assert!(matches!(r, Err(Error::Convergence(_))));
    }
}
