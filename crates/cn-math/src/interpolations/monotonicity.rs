//! Hyman monotonicity-constrained filter for cubic derivative estimates.
//!
//! See R. L. Dougherty, A. Edelman and J. M. Hyman, "Nonnegativity-,
//! Monotonicity-, or Convexity-Preserving Cubic and Quintic Hermite
//! Interpolation", Mathematics of Computation 52 (1989).
//!
//! The filter leaves an already monotonic cubic untouched; otherwise it
//! clamps the knot derivatives so that every segment whose data is
//! monotonic stays monotonic.

use cn_core::Real;

/// Clamp `m` in place against the Hyman bounds.
///
/// `s[i]` and `dx[i]` are the secant slope and width of segment `i`, so both
/// have one element fewer than `m`. Returns one flag per knot, set exactly
/// when the knot derivative was changed.
pub fn hyman_filter(m: &mut [Real], s: &[Real], dx: &[Real]) -> Vec<bool> {
    let n = m.len();
    debug_assert!(n >= 2 && s.len() == n - 1 && dx.len() == n - 1);
    let mut adjusted = vec![false; n];

    for i in 0..n {
        let correction = if i == 0 {
            clamp_to(m[i], s[0], (3.0 * s[0]).abs())
        } else if i == n - 1 {
            clamp_to(m[i], s[n - 2], (3.0 * s[n - 2]).abs())
        } else {
            let pm = (s[i - 1] * dx[i] + s[i] * dx[i - 1]) / (dx[i - 1] + dx[i]);
            let mut bound = 3.0 * s[i - 1].abs().min(s[i].abs()).min(pm.abs());
            if i > 1 && (s[i - 1] - s[i - 2]) * (s[i] - s[i - 1]) > 0.0 {
                let pd = (s[i - 1] * (2.0 * dx[i - 1] + dx[i - 2]) - s[i - 2] * dx[i - 1])
                    / (dx[i - 2] + dx[i - 1]);
                if pm * pd > 0.0 && pm * (s[i - 1] - s[i - 2]) > 0.0 {
                    bound = bound.max(1.5 * pm.abs().min(pd.abs()));
                }
            }
            if i + 2 < n && (s[i] - s[i - 1]) * (s[i + 1] - s[i]) > 0.0 {
                let pu = (s[i] * (2.0 * dx[i] + dx[i + 1]) - s[i + 1] * dx[i])
                    / (dx[i] + dx[i + 1]);
                if pm * pu > 0.0 && -pm * (s[i] - s[i - 1]) > 0.0 {
                    bound = bound.max(1.5 * pm.abs().min(pu.abs()));
                }
            }
            clamp_to(m[i], pm, bound)
        };
        if correction != m[i] {
            m[i] = correction;
            adjusted[i] = true;
        }
    }
    adjusted
}

/// Keep the sign of `m` when it agrees with `reference` and cap its
/// magnitude at `bound`; otherwise flatten to zero.
#[inline]
fn clamp_to(m: Real, reference: Real, bound: Real) -> Real {
    if m * reference > 0.0 {
        m.signum() * m.abs().min(bound)
    } else {
        0.0
    }
}
