//! Property-based tests for the interpolation engines.

use cn_math::interpolations::{
    cubic::NATURAL, ConvexMonotone, CubicInterpolation, DerivativeApprox, Interpolation1D,
};
use proptest::prelude::*;

const LOCAL_AND_SPLINE_SCHEMES: [DerivativeApprox; 8] = [
    DerivativeApprox::Spline,
    DerivativeApprox::SplineOM1,
    DerivativeApprox::SplineOM2,
    DerivativeApprox::Parabolic,
    DerivativeApprox::FritschButland,
    DerivativeApprox::Akima,
    DerivativeApprox::Kruger,
    DerivativeApprox::Harmonic,
];

/// Strictly increasing abscissas with arbitrary ordinates.
fn samples(max_points: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0.1_f64..2.0, -1.0_f64..1.0), 4..max_points).prop_map(|steps| {
        let mut x = 0.0;
        steps
            .into_iter()
            .map(|(dx, y)| {
                x += dx;
                (x, y)
            })
            .unzip()
    })
}

/// Strictly increasing abscissas with strictly increasing ordinates.
fn monotone_samples() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0.1_f64..2.0, 0.01_f64..1.0), 4..10).prop_map(|steps| {
        let (mut x, mut y) = (0.0, -1.0);
        steps
            .into_iter()
            .map(|(dx, dy)| {
                x += dx;
                y += dy;
                (x, y)
            })
            .unzip()
    })
}

/// Positive average forwards over increasing times starting at zero.
fn forward_samples() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0.1_f64..2.0, 0.001_f64..0.1), 2..10).prop_map(|steps| {
        let mut xs = vec![0.0];
        let mut ys = vec![0.0];
        let mut x = 0.0;
        for (dx, y) in steps {
            x += dx;
            xs.push(x);
            ys.push(y);
        }
        ys[0] = ys[1];
        (xs, ys)
    })
}

fn build<'a>(
    xs: &'a [f64],
    ys: &'a [f64],
    scheme: DerivativeApprox,
    monotonic: bool,
) -> CubicInterpolation<'a> {
    CubicInterpolation::new(xs, ys, scheme, monotonic, NATURAL, NATURAL).unwrap()
}

// ── Cubic engine ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn cubic_passes_through_the_samples((xs, ys) in samples(10)) {
        for scheme in LOCAL_AND_SPLINE_SCHEMES {
            for monotonic in [false, true] {
                let interp = build(&xs, &ys, scheme, monotonic);
                for (x, y) in xs.iter().zip(&ys) {
                    let value = interp.operator(*x);
                    prop_assert!(
                        (value - y).abs() <= 1e-9 * (1.0 + y.abs()),
                        "{scheme:?} (monotonic {monotonic}) at {x}: {value} vs {y}"
                    );
                }
            }
        }
    }

    #[test]
    fn cubic_is_continuously_differentiable((xs, ys) in samples(10)) {
        for scheme in LOCAL_AND_SPLINE_SCHEMES {
            let interp = build(&xs, &ys, scheme, false);
            let (a, b, c) = (interp.a_coefficients(), interp.b_coefficients(), interp.c_coefficients());
            for i in 1..xs.len() - 1 {
                let h = xs[i] - xs[i - 1];
                let left = a[i - 1] + 2.0 * b[i - 1] * h + 3.0 * c[i - 1] * h * h;
                prop_assert!(
                    (left - a[i]).abs() <= 1e-8 * (1.0 + a[i].abs()),
                    "{scheme:?} knot {i}: {left} vs {}", a[i]
                );
            }
        }
    }

    #[test]
    fn splines_have_continuous_second_derivative((xs, ys) in samples(9)) {
        for scheme in [DerivativeApprox::Spline, DerivativeApprox::SplineOM1, DerivativeApprox::SplineOM2] {
            let interp = build(&xs, &ys, scheme, false);
            let (b, c) = (interp.b_coefficients(), interp.c_coefficients());
            for i in 1..xs.len() - 1 {
                let h = xs[i] - xs[i - 1];
                let left = 2.0 * b[i - 1] + 6.0 * c[i - 1] * h;
                let right = 2.0 * b[i];
                prop_assert!(
                    (left - right).abs() <= 1e-6 * (1.0 + right.abs()),
                    "{scheme:?} knot {i}: {left} vs {right}"
                );
            }
        }
    }

    #[test]
    fn hyman_filter_keeps_monotone_data_monotone((xs, ys) in monotone_samples()) {
        for scheme in LOCAL_AND_SPLINE_SCHEMES {
            let interp = build(&xs, &ys, scheme, true);
            for w in xs.windows(2) {
                for k in 0..=20 {
                    let x = w[0] + (w[1] - w[0]) * k as f64 / 20.0;
                    let d = interp.derivative(x).unwrap();
                    prop_assert!(d >= -1e-12, "{scheme:?} derivative {d} at {x}");
                }
            }
        }
    }

    #[test]
    fn update_is_idempotent((xs, ys) in samples(8)) {
        for scheme in LOCAL_AND_SPLINE_SCHEMES {
            let mut interp = build(&xs, &ys, scheme, true);
            interp.update().unwrap();
            let once = interp.piecewise().clone();
            interp.update().unwrap();
            prop_assert_eq!(&once, interp.piecewise());
        }
    }
}

// ── Convex-monotone engine ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn convex_monotone_sections_preserve_area(
        (xs, ys) in forward_samples(),
        quadraticity in 0.0_f64..=1.0,
        monotonicity in 0.0_f64..=1.0,
        force_positive in any::<bool>(),
    ) {
        let interp = ConvexMonotone::new(quadraticity, monotonicity, force_positive)
            .interpolate(&xs, &ys)
            .unwrap();
        let sections = interp.section_map().sections();
        prop_assert_eq!(sections.len(), xs.len() - 1);
        for (i, (right, section)) in sections.iter().enumerate() {
            let area = section.primitive(*right) - section.primitive(xs[i]);
            let expected = ys[i + 1] * (xs[i + 1] - xs[i]);
            prop_assert!(
                (area - expected).abs() <= 1e-11,
                "interval {i}: {area} vs {expected}"
            );
        }
        let total: f64 = (1..xs.len()).map(|i| ys[i] * (xs[i] - xs[i - 1])).sum();
        let last = xs[xs.len() - 1];
        prop_assert!((interp.primitive(last).unwrap() - total).abs() <= 1e-11);
    }

    #[test]
    fn two_forwards_give_a_flat_curve(
        t in 0.1_f64..30.0,
        y0 in -0.1_f64..0.1,
        y1 in 0.001_f64..0.1,
    ) {
        let xs = [0.0, t];
        let ys = [y0, y1];
        let interp = ConvexMonotone::default().interpolate(&xs, &ys).unwrap();
        for x in [0.0, 0.5 * t, t, 2.0 * t] {
            prop_assert_eq!(interp.operator(x), y1);
        }
        prop_assert!((interp.primitive(t).unwrap() - y1 * t).abs() <= 1e-14 * (1.0 + t));
    }
}
