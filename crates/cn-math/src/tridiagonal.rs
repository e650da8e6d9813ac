//! Tridiagonal operator with a Thomas-algorithm solver
//! (translates the algebra part of `ql/methods/finitedifferences/tridiagonaloperator.hpp`).
//!
//! Rows are filled with the same `set_first_row` / `set_mid_row` /
//! `set_last_row` calls the spline scheme uses to describe its boundary
//! conditions.

use cn_core::{
    errors::{Error, Result},
    Real,
};

/// A square tridiagonal matrix stored as three bands.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalOperator {
    /// Sub-diagonal; `lower[i]` multiplies `x[i-1]` in row `i` (index 0 unused).
    lower: Vec<Real>,
    /// Main diagonal.
    diag: Vec<Real>,
    /// Super-diagonal; `upper[i]` multiplies `x[i+1]` in row `i` (last index unused).
    upper: Vec<Real>,
}

impl TridiagonalOperator {
    /// Create a zero operator of size `n`.
    pub fn new(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Set row 0 to `(diag, upper)`.
    pub fn set_first_row(&mut self, diag: Real, upper: Real) {
        self.diag[0] = diag;
        self.upper[0] = upper;
    }

    /// Set interior row `i` to `(lower, diag, upper)`.
    pub fn set_mid_row(&mut self, i: usize, lower: Real, diag: Real, upper: Real) {
        debug_assert!(i > 0 && i + 1 < self.size(), "row {i} is not an interior row");
        self.lower[i] = lower;
        self.diag[i] = diag;
        self.upper[i] = upper;
    }

    /// Set the last row to `(lower, diag)`.
    pub fn set_last_row(&mut self, lower: Real, diag: Real) {
        let n = self.size();
        self.lower[n - 1] = lower;
        self.diag[n - 1] = diag;
    }

    /// Apply the operator: `y = A · x`.
    pub fn apply(&self, x: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        cn_core::ensure!(
            x.len() == n,
            "vector size ({}) differs from operator size ({n})",
            x.len()
        );
        if n == 1 {
            return Ok(vec![self.diag[0] * x[0]]);
        }
        let mut y = vec![0.0; n];
        y[0] = self.diag[0] * x[0] + self.upper[0] * x[1];
        for i in 1..n - 1 {
            y[i] = self.lower[i] * x[i - 1] + self.diag[i] * x[i] + self.upper[i] * x[i + 1];
        }
        y[n - 1] = self.lower[n - 1] * x[n - 2] + self.diag[n - 1] * x[n - 1];
        Ok(y)
    }

    /// Solve `A · x = rhs` (Thomas algorithm).
    ///
    /// # Errors
    /// Fails when the sizes differ or a pivot vanishes; the algorithm does
    /// not pivot, so a zero pivot means the system cannot be solved this way.
    pub fn solve_for(&self, rhs: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        cn_core::ensure!(
            rhs.len() == n,
            "rhs vector size ({}) differs from operator size ({n})",
            rhs.len()
        );
        cn_core::ensure!(n > 0, "empty tridiagonal system");

        let mut c_prime = vec![0.0; n];
        let mut x = vec![0.0; n];

        let mut bet = self.diag[0];
        if bet == 0.0 {
            return Err(Error::Runtime(
                "division by zero in tridiagonal solve (row 0)".into(),
            ));
        }
        x[0] = rhs[0] / bet;

        for j in 1..n {
            c_prime[j] = self.upper[j - 1] / bet;
            bet = self.diag[j] - self.lower[j] * c_prime[j];
            if bet == 0.0 {
                return Err(Error::Runtime(format!(
                    "division by zero in tridiagonal solve (row {j})"
                )));
            }
            x[j] = (rhs[j] - self.lower[j] * x[j - 1]) / bet;
        }

        for j in (0..n - 1).rev() {
            x[j] -= c_prime[j + 1] * x[j + 1];
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn solves_identity() {
        let mut op = TridiagonalOperator::new(4);
        op.set_first_row(1.0, 0.0);
        op.set_mid_row(1, 0.0, 1.0, 0.0);
        op.set_mid_row(2, 0.0, 1.0, 0.0);
        op.set_last_row(0.0, 1.0);
        let rhs = [1.0, 2.0, 3.0, 4.0];
        let x = op.solve_for(&rhs).unwrap();
        for i in 0..4 {
            assert_abs_diff_eq!(x[i], rhs[i], epsilon = 1e-15);
        }
    }

    #[test]
    fn solves_second_difference() {
        // A = [[2, -1, 0], [-1, 2, -1], [0, -1, 2]], x = [1, 2, 3] → Ax = [0, 0, 4]
        let mut op = TridiagonalOperator::new(3);
        op.set_first_row(2.0, -1.0);
        op.set_mid_row(1, -1.0, 2.0, -1.0);
        op.set_last_row(-1.0, 2.0);
        let x = op.solve_for(&[0.0, 0.0, 4.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 3.0, epsilon = 1e-12);

        let back = op.apply(&x).unwrap();
        assert_abs_diff_eq!(back[2], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_pivot_is_an_error() {
        let mut op = TridiagonalOperator::new(2);
        op.set_first_row(0.0, 1.0);
        op.set_last_row(1.0, 0.0);
        assert!(op.solve_for(&[1.0, 1.0]).is_err());
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let op = TridiagonalOperator::new(3);
        assert!(matches!(
            op.solve_for(&[1.0, 2.0]),
            Err(Error::Precondition(_))
        ));
    }
}
