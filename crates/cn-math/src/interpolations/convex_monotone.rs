//! Hagan-West convex-monotone interpolation
//! (translates `ql/math/interpolations/convexmonotoneinterpolation.hpp`).
//!
//! The interpolant is meant for instantaneous forward rates: `y[i]` is the
//! average forward over `(x[i-1], x[i]]`, so `y[0]` is ignored and every
//! section integrates exactly to `y[i]·(x[i] - x[i-1])`.
//!
//! See P. S. Hagan and G. West, "Interpolation Methods for Curve
//! Construction", Applied Mathematical Finance 13 (2006).

use cn_core::{
    errors::{Error, Result},
    Real,
};

use super::{check_samples, Interpolation1D};

// ── Sections ──────────────────────────────────────────────────────────────────

/// Parameters shared by the convex-monotone section shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexMonotoneShape {
    x_prev: Real,
    x_scaling: Real,
    g_prev: Real,
    g_next: Real,
    f_average: Real,
    eta: Real,
    prev_primitive: Real,
}

impl ConvexMonotoneShape {
    fn new(
        x_prev: Real,
        x_next: Real,
        g_prev: Real,
        g_next: Real,
        f_average: Real,
        eta: Real,
        prev_primitive: Real,
    ) -> Self {
        Self {
            x_prev,
            x_scaling: x_next - x_prev,
            g_prev,
            g_next,
            f_average,
            eta,
            prev_primitive,
        }
    }

    #[inline]
    fn x_val(&self, x: Real) -> Real {
        (x - self.x_prev) / self.x_scaling
    }

    /// Position of the hinge inside the section, in `[0, 1]`.
    pub fn eta(&self) -> Real {
        self.eta
    }
}

/// Zero-floored region of a [`ConvexMonotone4Shape`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cm4Split {
    x_ratio: Real,
    x2: Real,
    x3: Real,
}

/// Section of type 4: two parabolas meeting at the hinge.
///
/// The positive variant floors the section at zero over `[x2, x3)` when the
/// plain shape would dip below zero, shifting the parabolas to keep the area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexMonotone4Shape {
    shape: ConvexMonotoneShape,
    a: Real,
    split: Option<Cm4Split>,
}

impl ConvexMonotone4Shape {
    fn new(shape: ConvexMonotoneShape) -> Self {
        let a = -0.5 * (shape.eta * shape.g_prev + (1.0 - shape.eta) * shape.g_next);
        Self {
            shape,
            a,
            split: None,
        }
    }

    fn new_positive(shape: ConvexMonotoneShape) -> Self {
        let mut out = Self::new(shape);
        if out.a + out.shape.f_average <= 0.0 {
            let s = &mut out.shape;
            let eta = s.eta;
            let f_prev = s.g_prev + s.f_average;
            let f_next = s.g_next + s.f_average;
            let shift = (eta * f_prev + (1.0 - eta) * f_next) / 3.0 - s.f_average;
            let period = shift * s.x_scaling / (s.f_average + shift);
            let x_adjust = s.x_scaling - period;

            s.f_average += shift;
            s.g_next = f_next - s.f_average;
            s.g_prev = f_prev - s.f_average;
            out.a = -(eta * s.g_prev + (1.0 - eta) * s.g_next) / 2.0;
            out.split = Some(Cm4Split {
                x_ratio: x_adjust / s.x_scaling,
                x2: s.x_prev + x_adjust * eta,
                x3: s.x_prev + s.x_scaling - x_adjust * (1.0 - eta),
            });
        }
        out
    }

    /// `true` when part of the section is floored at zero.
    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }

    fn left_value(&self, x_val: Real) -> Real {
        let s = &self.shape;
        s.f_average + self.a + (s.g_prev - self.a) * (s.eta - x_val) * (s.eta - x_val) / (s.eta * s.eta)
    }

    fn right_value(&self, x_val: Real) -> Real {
        let s = &self.shape;
        s.f_average
            + self.a
            + (s.g_next - self.a) * (x_val - s.eta) * (x_val - s.eta)
                / ((1.0 - s.eta) * (1.0 - s.eta))
    }

    // primitives on the unit interval, before scaling and offset

    fn left_primitive(&self, x_val: Real) -> Real {
        let s = &self.shape;
        (s.f_average
            + self.a
            + (s.g_prev - self.a) / (s.eta * s.eta)
                * (s.eta * s.eta - s.eta * x_val + 1.0 / 3.0 * x_val * x_val))
            * x_val
    }

    fn right_primitive(&self, x_val: Real) -> Real {
        let s = &self.shape;
        let eta = s.eta;
        s.f_average * x_val
            + self.a * x_val
            + (s.g_prev - self.a) * (1.0 / 3.0 * eta)
            + (s.g_next - self.a) / ((1.0 - eta) * (1.0 - eta))
                * (1.0 / 3.0 * x_val * x_val * x_val - eta * x_val * x_val + eta * eta * x_val
                    - 1.0 / 3.0 * eta * eta * eta)
    }

    fn value(&self, x: Real) -> Real {
        let x_val = self.shape.x_val(x);
        match self.split {
            None if x_val <= self.shape.eta => self.left_value(x_val),
            None => self.right_value(x_val),
            Some(split) if x <= split.x2 => self.left_value(x_val / split.x_ratio),
            Some(split) if x < split.x3 => 0.0,
            Some(split) => self.right_value(1.0 - (1.0 - x_val) / split.x_ratio),
        }
    }

    fn primitive(&self, x: Real) -> Real {
        let s = &self.shape;
        let x_val = s.x_val(x);
        match self.split {
            None if x_val <= s.eta => s.prev_primitive + s.x_scaling * self.left_primitive(x_val),
            None => s.prev_primitive + s.x_scaling * self.right_primitive(x_val),
            Some(split) => {
                let scale = s.x_scaling * split.x_ratio;
                if x <= split.x2 {
                    s.prev_primitive + scale * self.left_primitive(x_val / split.x_ratio)
                } else if x <= split.x3 {
                    s.prev_primitive
                        + scale
                            * (s.f_average * s.eta
                                + self.a * s.eta
                                + (s.g_prev - self.a) / (s.eta * s.eta)
                                    * (1.0 / 3.0 * s.eta * s.eta * s.eta))
                } else {
                    s.prev_primitive
                        + scale * self.right_primitive(1.0 - (1.0 - x_val) / split.x_ratio)
                }
            }
        }
    }
}

/// Quadratic matching both boundary forwards and the section average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticShape {
    x_prev: Real,
    x_scaling: Real,
    a: Real,
    b: Real,
    c: Real,
    prev_primitive: Real,
    f_next: Real,
}

impl QuadraticShape {
    fn new(
        x_prev: Real,
        x_next: Real,
        f_prev: Real,
        f_next: Real,
        f_average: Real,
        prev_primitive: Real,
    ) -> Self {
        Self {
            x_prev,
            x_scaling: x_next - x_prev,
            a: 3.0 * f_prev + 3.0 * f_next - 6.0 * f_average,
            b: -(4.0 * f_prev + 2.0 * f_next - 6.0 * f_average),
            c: f_prev,
            prev_primitive,
            f_next,
        }
    }

    fn value(&self, x: Real) -> Real {
        let x_val = (x - self.x_prev) / self.x_scaling;
        self.a * x_val * x_val + self.b * x_val + self.c
    }

    fn primitive(&self, x: Real) -> Real {
        let x_val = (x - self.x_prev) / self.x_scaling;
        self.prev_primitive
            + self.x_scaling * (self.a / 3.0 * x_val * x_val + self.b / 2.0 * x_val + self.c) * x_val
    }
}

/// Zero-floored region of a [`QuadraticMinShape`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct QuadraticSplit {
    x_ratio: Real,
    x2: Real,
    x3: Real,
    primitive2: Real,
}

/// Quadratic section floored at zero where the plain quadratic would turn
/// negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticMinShape {
    x1: Real,
    x4: Real,
    x_scaling: Real,
    a: Real,
    b: Real,
    c: Real,
    primitive1: Real,
    f_next: Real,
    split: Option<QuadraticSplit>,
}

impl QuadraticMinShape {
    fn new(
        x_prev: Real,
        x_next: Real,
        f_prev: Real,
        f_next: Real,
        f_average: Real,
        prev_primitive: Real,
    ) -> Self {
        let mut out = Self {
            x1: x_prev,
            x4: x_next,
            x_scaling: x_next - x_prev,
            a: 3.0 * f_prev + 3.0 * f_next - 6.0 * f_average,
            b: -(4.0 * f_prev + 2.0 * f_next - 6.0 * f_average),
            c: f_prev,
            primitive1: prev_primitive,
            f_next,
            split: None,
        };
        let d = out.b * out.b - 4.0 * out.a * out.c;
        if d > 0.0 {
            let a_av = 36.0;
            let b_av = -24.0 * (f_prev + f_next);
            let c_av = 4.0 * (f_prev * f_prev + f_prev * f_next + f_next * f_next);
            let d_av = b_av * b_av - 4.0 * a_av * c_av;
            if d_av >= 0.0 {
                let av_root = (-b_av - d_av.sqrt()) / (2.0 * a_av);
                let x_ratio = f_average / av_root;
                out.x_scaling *= x_ratio;

                out.a = 3.0 * f_prev + 3.0 * f_next - 6.0 * av_root;
                out.b = -(4.0 * f_prev + 2.0 * f_next - 6.0 * av_root);
                out.c = f_prev;
                let x_root = -out.b / (2.0 * out.a);
                let width = out.x4 - out.x1;
                out.split = Some(QuadraticSplit {
                    x_ratio,
                    x2: out.x1 + x_ratio * width * x_root,
                    x3: out.x4 - x_ratio * width * (1.0 - x_root),
                    primitive2: out.primitive1
                        + out.x_scaling
                            * (out.a / 3.0 * x_root * x_root + out.b / 2.0 * x_root + out.c)
                            * x_root,
                });
            }
        }
        out
    }

    /// `true` when part of the section is floored at zero.
    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }

    fn value(&self, x: Real) -> Real {
        let mut x_val = (x - self.x1) / (self.x4 - self.x1);
        if let Some(split) = self.split {
            if x <= split.x2 {
                x_val /= split.x_ratio;
            } else if x < split.x3 {
                return 0.0;
            } else {
                x_val = 1.0 - (1.0 - x_val) / split.x_ratio;
            }
        }
        self.c + self.b * x_val + self.a * x_val * x_val
    }

    fn primitive(&self, x: Real) -> Real {
        let mut x_val = (x - self.x1) / (self.x4 - self.x1);
        if let Some(split) = self.split {
            if x < split.x2 {
                x_val /= split.x_ratio;
            } else if x < split.x3 {
                return split.primitive2;
            } else {
                x_val = 1.0 - (1.0 - x_val) / split.x_ratio;
            }
        }
        self.primitive1
            + self.x_scaling * (self.a / 3.0 * x_val * x_val + self.b / 2.0 * x_val + self.c) * x_val
    }
}

/// One analytic piece of the convex-monotone interpolant.
///
/// Every variant carries the primitive accumulated up to its left edge, so
/// `primitive` is the integral from the first knot.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Flat at `value` to the right of `x_prev`.
    EverywhereConstant {
        /// Constant value.
        value: Real,
        /// Primitive at `x_prev`.
        prev_primitive: Real,
        /// Left edge.
        x_prev: Real,
    },
    /// Straight line between the two boundary forwards.
    ConstantGradient {
        /// Value at the left edge.
        f_prev: Real,
        /// Primitive at `x_prev`.
        prev_primitive: Real,
        /// Left edge.
        x_prev: Real,
        /// Slope.
        gradient: Real,
        /// Value at the right edge.
        f_next: Real,
    },
    /// Plain quadratic.
    Quadratic(QuadraticShape),
    /// Quadratic floored at zero.
    QuadraticMin(QuadraticMinShape),
    /// Flat then convex.
    ConvexMonotone2(ConvexMonotoneShape),
    /// Convex then flat.
    ConvexMonotone3(ConvexMonotoneShape),
    /// Two parabolas joined at the hinge.
    ConvexMonotone4(ConvexMonotone4Shape),
    /// Two parabolas joined at the hinge, floored at zero.
    ConvexMonotone4Min(ConvexMonotone4Shape),
    /// Weighted blend of a quadratic and a convex-monotone section.
    Combo {
        /// Quadratic candidate.
        quadratic: Box<Section>,
        /// Convex-monotone candidate.
        convex_monotone: Box<Section>,
        /// Weight of the quadratic candidate, strictly inside `(0, 1)`.
        quadraticity: Real,
    },
}

impl Section {
    fn everywhere_constant(value: Real, prev_primitive: Real, x_prev: Real) -> Self {
        Self::EverywhereConstant {
            value,
            prev_primitive,
            x_prev,
        }
    }

    fn constant_gradient(
        f_prev: Real,
        prev_primitive: Real,
        x_prev: Real,
        x_next: Real,
        f_next: Real,
    ) -> Self {
        Self::ConstantGradient {
            f_prev,
            prev_primitive,
            x_prev,
            gradient: (f_next - f_prev) / (x_next - x_prev),
            f_next,
        }
    }

    fn combo(quadratic: Section, convex_monotone: Section, quadraticity: Real) -> Result<Self> {
        cn_core::ensure!(
            quadraticity < 1.0 && quadraticity > 0.0,
            "Quadratic value must lie between 0 and 1"
        );
        Ok(Self::Combo {
            quadratic: Box::new(quadratic),
            convex_monotone: Box::new(convex_monotone),
            quadraticity,
        })
    }

    /// Value at `x`.
    pub fn value(&self, x: Real) -> Real {
        match self {
            Self::EverywhereConstant { value, .. } => *value,
            Self::ConstantGradient {
                f_prev,
                x_prev,
                gradient,
                ..
            } => f_prev + (x - x_prev) * gradient,
            Self::Quadratic(q) => q.value(x),
            Self::QuadraticMin(q) => q.value(x),
            Self::ConvexMonotone2(s) => {
                let x_val = s.x_val(x);
                if x_val <= s.eta {
                    s.f_average + s.g_prev
                } else {
                    s.f_average
                        + s.g_prev
                        + (s.g_next - s.g_prev) / ((1.0 - s.eta) * (1.0 - s.eta))
                            * (x_val - s.eta)
                            * (x_val - s.eta)
                }
            }
            Self::ConvexMonotone3(s) => {
                let x_val = s.x_val(x);
                if x_val <= s.eta {
                    s.f_average
                        + s.g_next
                        + (s.g_prev - s.g_next) / (s.eta * s.eta) * (s.eta - x_val) * (s.eta - x_val)
                } else {
                    s.f_average + s.g_next
                }
            }
            Self::ConvexMonotone4(s) | Self::ConvexMonotone4Min(s) => s.value(x),
            Self::Combo {
                quadratic,
                convex_monotone,
                quadraticity,
            } => quadraticity * quadratic.value(x) + (1.0 - quadraticity) * convex_monotone.value(x),
        }
    }

    /// Integral from the first knot to `x`.
    pub fn primitive(&self, x: Real) -> Real {
        match self {
            Self::EverywhereConstant {
                value,
                prev_primitive,
                x_prev,
            } => prev_primitive + (x - x_prev) * value,
            Self::ConstantGradient {
                f_prev,
                prev_primitive,
                x_prev,
                gradient,
                ..
            } => prev_primitive + (x - x_prev) * (f_prev + 0.5 * (x - x_prev) * gradient),
            Self::Quadratic(q) => q.primitive(x),
            Self::QuadraticMin(q) => q.primitive(x),
            Self::ConvexMonotone2(s) => {
                let x_val = s.x_val(x);
                let linear = s.f_average * x_val + s.g_prev * x_val;
                if x_val <= s.eta {
                    s.prev_primitive + s.x_scaling * linear
                } else {
                    let eta = s.eta;
                    s.prev_primitive
                        + s.x_scaling
                            * (linear
                                + (s.g_next - s.g_prev) / ((1.0 - eta) * (1.0 - eta))
                                    * (1.0 / 3.0 * (x_val * x_val * x_val - eta * eta * eta)
                                        - eta * x_val * x_val
                                        + eta * eta * x_val))
                }
            }
            Self::ConvexMonotone3(s) => {
                let x_val = s.x_val(x);
                let eta = s.eta;
                let linear = s.f_average * x_val + s.g_next * x_val;
                let weight = (s.g_prev - s.g_next) / (eta * eta);
                if x_val <= eta {
                    s.prev_primitive
                        + s.x_scaling
                            * (linear
                                + weight
                                    * (1.0 / 3.0 * x_val * x_val * x_val - eta * x_val * x_val
                                        + eta * eta * x_val))
                } else {
                    s.prev_primitive + s.x_scaling * (linear + weight * (1.0 / 3.0 * eta * eta * eta))
                }
            }
            Self::ConvexMonotone4(s) | Self::ConvexMonotone4Min(s) => s.primitive(x),
            Self::Combo {
                quadratic,
                convex_monotone,
                quadraticity,
            } => {
                quadraticity * quadratic.primitive(x)
                    + (1.0 - quadraticity) * convex_monotone.primitive(x)
            }
        }
    }

    /// Value approached at the right edge of the section.
    pub fn f_next(&self) -> Real {
        match self {
            Self::EverywhereConstant { value, .. } => *value,
            Self::ConstantGradient { f_next, .. } => *f_next,
            Self::Quadratic(q) => q.f_next,
            Self::QuadraticMin(q) => q.f_next,
            Self::ConvexMonotone2(s) | Self::ConvexMonotone3(s) => s.f_average + s.g_next,
            Self::ConvexMonotone4(s) | Self::ConvexMonotone4Min(s) => {
                s.shape.f_average + s.shape.g_next
            }
            Self::Combo {
                quadratic,
                convex_monotone,
                quadraticity,
            } => quadraticity * quadratic.f_next() + (1.0 - quadraticity) * convex_monotone.f_next(),
        }
    }
}

// ── Factory / settings ────────────────────────────────────────────────────────

/// Convex-monotone interpolation factory.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvexMonotone {
    /// Weight of the quadratic candidate in `[0, 1]`.
    pub quadraticity: Real,
    /// Monotonicity preference in `[0, 1]`; widens the admissible hinge range.
    pub monotonicity: Real,
    /// Floor the interpolant at zero.
    pub force_positive: bool,
}

impl Default for ConvexMonotone {
    fn default() -> Self {
        Self {
            quadraticity: 0.3,
            monotonicity: 0.7,
            force_positive: true,
        }
    }
}

impl ConvexMonotone {
    /// Whether the scheme is global.
    pub const GLOBAL: bool = true;
    /// Minimum number of points.
    pub const REQUIRED_POINTS: usize = 2;
    /// The first sample is ignored.
    pub const DATA_SIZE_ADJUSTMENT: usize = 1;

    /// Create a factory with the given settings.
    pub fn new(quadraticity: Real, monotonicity: Real, force_positive: bool) -> Self {
        Self {
            quadraticity,
            monotonicity,
            force_positive,
        }
    }

    /// Build an interpolation over `xs`, `ys`.
    pub fn interpolate<'a>(
        &self,
        xs: &'a [Real],
        ys: &'a [Real],
    ) -> Result<ConvexMonotoneInterpolation<'a>> {
        ConvexMonotoneInterpolation::new(xs, ys, *self, false, Vec::new())
    }

    /// Incremental build used while bootstrapping a curve point by point.
    ///
    /// The first call (when `xs.len() - localisation == 1`) builds from
    /// scratch; later calls reuse the sections of `previous`. The last
    /// period is kept flat until the curve reaches `final_size` points.
    pub fn local_interpolate<'a>(
        &self,
        xs: &'a [Real],
        ys: &'a [Real],
        localisation: usize,
        previous: Option<&ConvexMonotoneInterpolation<'_>>,
        final_size: usize,
    ) -> Result<ConvexMonotoneInterpolation<'a>> {
        let flat_final_period = xs.len() != final_size;
        let existing = if xs.len().checked_sub(localisation) == Some(1) {
            Vec::new()
        } else {
            previous
                .ok_or_else(|| {
                    Error::Precondition(
                        "a previous interpolation is required after the first local build".into(),
                    )
                })?
                .existing_helpers()
        };
        ConvexMonotoneInterpolation::new(xs, ys, *self, flat_final_period, existing)
    }
}

// ── Section map ───────────────────────────────────────────────────────────────

/// Sections keyed by their right edge, plus the extrapolation section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMap {
    sections: Vec<(Real, Section)>,
    extrapolation: Section,
    x_last: Real,
    constant_last_period: bool,
}

impl SectionMap {
    /// Build the sections for `(xs, ys)`.
    ///
    /// `pre_existing` holds sections already built for a prefix of the
    /// knots (keyed by right edge, ascending); they are reused as is.
    pub fn build(
        xs: &[Real],
        ys: &[Real],
        settings: ConvexMonotone,
        constant_last_period: bool,
        pre_existing: Vec<(Real, Section)>,
    ) -> Result<Self> {
        let ConvexMonotone {
            quadraticity,
            monotonicity,
            force_positive,
        } = settings;
        cn_core::ensure!(
            (0.0..=1.0).contains(&monotonicity),
            "Monotonicity must lie between 0 and 1"
        );
        cn_core::ensure!(
            (0.0..=1.0).contains(&quadraticity),
            "Quadraticity must lie between 0 and 1"
        );
        check_samples(xs, ys, 2, "convex monotone interpolation (first point is ignored)")?;
        let n = xs.len();
        cn_core::ensure!(
            n > pre_existing.len() + 1,
            "Too many existing helpers have been supplied"
        );

        if n == 2 {
            let single = Section::everywhere_constant(ys[1], 0.0, xs[0]);
            return Ok(Self {
                sections: vec![(xs[1], single.clone())],
                extrapolation: single,
                x_last: xs[1],
                constant_last_period,
            });
        }

        let reused = pre_existing.len();
        let start = reused + 1;
        let mut f = vec![0.0; n];
        let last_pre_f_next = pre_existing.last().map(|(_, s)| s.f_next());
        let mut sections = pre_existing;

        // boundary forwards
        for i in start..n - 1 {
            let dx_prev = xs[i] - xs[i - 1];
            let dx = xs[i + 1] - xs[i];
            f[i] = dx / (dx + dx_prev) * ys[i] + dx_prev / (dx + dx_prev) * ys[i + 1];
        }
        if let Some(f_next) = last_pre_f_next {
            f[start - 1] = f_next;
        } else {
            f[0] = 1.5 * ys[1] - 0.5 * f[1];
        }
        f[n - 1] = 1.5 * ys[n - 1] - 0.5 * f[n - 2];

        if force_positive {
            if f[0] < 0.0 {
                f[0] = 0.0;
            }
            if f[n - 1] < 0.0 {
                f[n - 1] = 0.0;
            }
        }

        let mut primitive: Real = (0..start - 1).map(|i| ys[i + 1] * (xs[i + 1] - xs[i])).sum();

        let end = if constant_last_period { n - 1 } else { n };
        let b2 = (1.0 + monotonicity) / 2.0;
        let b3 = (1.0 - monotonicity) / 2.0;

        for i in start..end {
            let (x_prev, x_next) = (xs[i - 1], xs[i]);
            let g_prev = f[i - 1] - ys[i];
            let g_next = f[i] - ys[i];

            let section = if g_prev.abs() < 1.0e-14 && g_next.abs() < 1.0e-14 {
                Section::constant_gradient(f[i - 1], primitive, x_prev, x_next, f[i])
            } else {
                let quadratic_min =
                    || QuadraticMinShape::new(x_prev, x_next, f[i - 1], f[i], ys[i], primitive);
                let plain_quadratic =
                    || QuadraticShape::new(x_prev, x_next, f[i - 1], f[i], ys[i], primitive);
                let cm_shape =
                    |eta| ConvexMonotoneShape::new(x_prev, x_next, g_prev, g_next, ys[i], eta, primitive);
                let cm4 = |eta| {
                    if force_positive {
                        Section::ConvexMonotone4Min(ConvexMonotone4Shape::new_positive(cm_shape(eta)))
                    } else {
                        Section::ConvexMonotone4(ConvexMonotone4Shape::new(cm_shape(eta)))
                    }
                };

                let mut weight = quadraticity;
                let mut quadratic = None;
                let mut convex_monotone = None;

                if quadraticity > 0.0 {
                    quadratic = Some(
                        if g_prev >= -2.0 * g_next && g_prev > -0.5 * g_next && force_positive {
                            Section::QuadraticMin(quadratic_min())
                        } else {
                            Section::Quadratic(plain_quadratic())
                        },
                    );
                }
                if quadraticity < 1.0 {
                    if (g_prev > 0.0 && -0.5 * g_prev >= g_next && g_next >= -2.0 * g_prev)
                        || (g_prev < 0.0 && -0.5 * g_prev <= g_next && g_next <= -2.0 * g_prev)
                    {
                        weight = 1.0;
                        if quadraticity == 0.0 {
                            quadratic = Some(if force_positive {
                                Section::QuadraticMin(quadratic_min())
                            } else {
                                Section::Quadratic(plain_quadratic())
                            });
                        }
                    } else if (g_prev < 0.0 && g_next > -2.0 * g_prev)
                        || (g_prev > 0.0 && g_next < -2.0 * g_prev)
                    {
                        let eta = (g_next + 2.0 * g_prev) / (g_next - g_prev);
                        convex_monotone = Some(if eta < b2 {
                            Section::ConvexMonotone2(cm_shape(eta))
                        } else {
                            cm4(b2)
                        });
                    } else if (g_prev > 0.0 && g_next < 0.0 && g_next > -0.5 * g_prev)
                        || (g_prev < 0.0 && g_next > 0.0 && g_next < -0.5 * g_prev)
                    {
                        let eta = g_next / (g_next - g_prev) * 3.0;
                        convex_monotone = Some(if eta > b3 {
                            Section::ConvexMonotone3(cm_shape(eta))
                        } else {
                            cm4(b3)
                        });
                    } else {
                        let eta = (g_next / (g_prev + g_next)).min(b2).max(b3);
                        convex_monotone = Some(cm4(eta));
                    }
                }

                match (weight, quadratic, convex_monotone) {
                    (w, Some(q), _) if w == 1.0 => q,
                    (w, _, Some(cm)) if w == 0.0 => cm,
                    (w, Some(q), Some(cm)) => Section::combo(q, cm, w)?,
                    _ => {
                        return Err(Error::Runtime(format!(
                            "no section candidate for interval {i} (quadraticity {weight})"
                        )))
                    }
                }
            };
            sections.push((x_next, section));
            primitive += ys[i] * (xs[i] - xs[i - 1]);
        }

        let extrapolation = if constant_last_period {
            let flat = Section::everywhere_constant(ys[n - 1], primitive, xs[n - 2]);
            sections.push((xs[n - 1], flat.clone()));
            flat
        } else {
            let x_last = xs[n - 1];
            let last_value = sections
                .last()
                .map(|(_, s)| s.value(x_last))
                .unwrap_or(ys[n - 1]);
            Section::everywhere_constant(last_value, primitive, x_last)
        };

        #[cfg(feature = "logging")]
        tracing::debug!(
            points = n,
            sections_reused = reused,
            sections_rebuilt = sections.len() - reused,
            constant_last_period,
            "convex-monotone sections built"
        );

        Ok(Self {
            sections,
            extrapolation,
            x_last: xs[n - 1],
            constant_last_period,
        })
    }

    fn section_at(&self, x: Real) -> &Section {
        if x >= self.x_last {
            return &self.extrapolation;
        }
        let idx = self.sections.partition_point(|(key, _)| *key <= x);
        self.sections
            .get(idx)
            .map_or(&self.extrapolation, |(_, section)| section)
    }

    /// Value at `x`.
    pub fn value(&self, x: Real) -> Real {
        self.section_at(x).value(x)
    }

    /// Integral from the first knot to `x`.
    pub fn primitive(&self, x: Real) -> Real {
        self.section_at(x).primitive(x)
    }

    /// All sections keyed by right edge.
    pub fn sections(&self) -> &[(Real, Section)] {
        &self.sections
    }

    /// Section used at and beyond the last knot.
    pub fn extrapolation(&self) -> &Section {
        &self.extrapolation
    }

    /// Sections that a later incremental build may reuse: all of them, minus
    /// the forced-flat last period.
    pub fn existing_helpers(&self) -> Vec<(Real, Section)> {
        let mut out = self.sections.clone();
        if self.constant_last_period {
            out.retain(|(key, _)| *key != self.x_last);
        }
        out
    }
}

// ── ConvexMonotoneInterpolation ───────────────────────────────────────────────

/// Convex-monotone interpolation over borrowed sample slices.
#[derive(Debug, Clone)]
pub struct ConvexMonotoneInterpolation<'a> {
    xs: &'a [Real],
    ys: &'a [Real],
    settings: ConvexMonotone,
    constant_last_period: bool,
    pre_existing: Vec<(Real, Section)>,
    map: SectionMap,
}

impl<'a> ConvexMonotoneInterpolation<'a> {
    /// Build the interpolation; see [`SectionMap::build`].
    pub fn new(
        xs: &'a [Real],
        ys: &'a [Real],
        settings: ConvexMonotone,
        constant_last_period: bool,
        pre_existing: Vec<(Real, Section)>,
    ) -> Result<Self> {
        let map = SectionMap::build(xs, ys, settings, constant_last_period, pre_existing.clone())?;
        Ok(Self {
            xs,
            ys,
            settings,
            constant_last_period,
            pre_existing,
            map,
        })
    }

    /// Rebuild the sections from the current samples.
    pub fn update(&mut self) -> Result<()> {
        self.map = SectionMap::build(
            self.xs,
            self.ys,
            self.settings,
            self.constant_last_period,
            self.pre_existing.clone(),
        )?;
        Ok(())
    }

    /// The underlying section map.
    pub fn section_map(&self) -> &SectionMap {
        &self.map
    }

    /// See [`SectionMap::existing_helpers`].
    pub fn existing_helpers(&self) -> Vec<(Real, Section)> {
        self.map.existing_helpers()
    }
}

impl Interpolation1D for ConvexMonotoneInterpolation<'_> {
    fn operator(&self, x: Real) -> Real {
        self.map.value(x)
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn primitive(&self, x: Real) -> Result<Real> {
        Ok(self.map.primitive(x))
    }

    fn derivative(&self, _x: Real) -> Result<Real> {
        Err(Error::NotImplemented(
            "Convex-monotone spline derivative".into(),
        ))
    }

    fn second_derivative(&self, _x: Real) -> Result<Real> {
        Err(Error::NotImplemented(
            "Convex-monotone spline second derivative".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrals::{GaussKronrodAdaptive, Integrator};
    use approx::assert_abs_diff_eq;

    const XS: [Real; 6] = [0.0, 0.5, 1.0, 2.0, 3.0, 5.0];
    const FORWARDS: [Real; 6] = [0.0, 0.030, 0.034, 0.031, 0.041, 0.045];

    fn assert_area_preserved(interp: &ConvexMonotoneInterpolation<'_>, xs: &[Real], ys: &[Real]) {
        let sections = interp.section_map().sections();
        assert_eq!(sections.len(), xs.len() - 1);
        for (i, (right, section)) in sections.iter().enumerate() {
            assert_eq!(*right, xs[i + 1]);
            let area = section.primitive(*right) - section.primitive(xs[i]);
            let expected = ys[i + 1] * (xs[i + 1] - xs[i]);
            assert!(
                (area - expected).abs() < 1e-12,
                "interval {i}: expected {expected}, got {area}"
            );
        }
    }

    #[test]
    fn repeated_or_unsorted_times_are_rejected() {
        let ys = [0.01, 0.02, 0.03, 0.04];
        for xs in [[0.0, 1.0, 1.0, 3.0], [0.0, 2.0, 1.0, 3.0]] {
            assert!(matches!(
                ConvexMonotone::default().interpolate(&xs, &ys),
                Err(Error::Precondition(_))
            ));
        }
    }

    #[test]
    fn two_points_give_a_single_constant_section() {
        let xs = [1.0, 4.0];
        let ys = [123.0, 5.0];
        let interp = ConvexMonotone::default().interpolate(&xs, &ys).unwrap();
        assert_eq!(interp.section_map().sections().len(), 1);
        assert!(matches!(
            interp.section_map().sections()[0].1,
            Section::EverywhereConstant { .. }
        ));
        for &x in &[1.0, 2.2, 3.9, 4.0, 7.0] {
            assert_eq!(interp.operator(x), 5.0);
        }
        assert_abs_diff_eq!(
            interp.primitive(4.0).unwrap() - interp.primitive(1.0).unwrap(),
            15.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn area_is_preserved_for_every_setting() {
        for &q in &[0.0, 0.3, 1.0] {
            for &m in &[0.0, 0.7, 1.0] {
                for &positive in &[true, false] {
                    let interp = ConvexMonotone::new(q, m, positive)
                        .interpolate(&XS, &FORWARDS)
                        .unwrap();
                    assert_area_preserved(&interp, &XS, &FORWARDS);
                }
            }
        }
    }

    #[test]
    fn value_integrates_to_the_interval_average() {
        let gk = GaussKronrodAdaptive::new(1e-11, 1_000_000).unwrap();
        for &(q, m, positive) in &[(0.3, 0.7, true), (0.0, 0.7, true), (1.0, 0.0, false)] {
            let interp = ConvexMonotone::new(q, m, positive)
                .interpolate(&XS, &FORWARDS)
                .unwrap();
            for i in 1..XS.len() {
                let area = gk.integrate(|x| interp.operator(x), XS[i - 1], XS[i]).unwrap();
                assert_abs_diff_eq!(area, FORWARDS[i] * (XS[i] - XS[i - 1]), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn flat_data_gives_constant_gradient_sections() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.02; 4];
        let interp = ConvexMonotone::default().interpolate(&xs, &ys).unwrap();
        for (_, section) in interp.section_map().sections() {
            assert!(matches!(section, Section::ConstantGradient { .. }));
        }
        assert_abs_diff_eq!(interp.operator(1.7), 0.02, epsilon = 1e-15);
    }

    #[test]
    fn extrapolation_continues_the_last_value() {
        let interp = ConvexMonotone::default().interpolate(&XS, &FORWARDS).unwrap();
        let at_end = interp.operator(5.0);
        assert_abs_diff_eq!(interp.operator(8.0), at_end, epsilon = 1e-15);
        let p5 = interp.primitive(5.0).unwrap();
        assert_abs_diff_eq!(interp.primitive(8.0).unwrap(), p5 + 3.0 * at_end, epsilon = 1e-14);
    }

    #[test]
    fn constant_last_period_is_flat_and_not_reusable() {
        let interp =
            ConvexMonotoneInterpolation::new(&XS, &FORWARDS, ConvexMonotone::default(), true, Vec::new())
                .unwrap();
        assert_abs_diff_eq!(interp.operator(4.0), FORWARDS[5], epsilon = 1e-15);
        assert_abs_diff_eq!(interp.operator(9.0), FORWARDS[5], epsilon = 1e-15);
        assert_area_preserved(&interp, &XS, &FORWARDS);

        let helpers = interp.existing_helpers();
        assert_eq!(helpers.len(), XS.len() - 2);
        assert!(helpers.iter().all(|(key, _)| *key != 5.0));
    }

    #[test]
    fn incremental_build_matches_full_build() {
        let factory = ConvexMonotone::default();
        let full = factory.interpolate(&XS, &FORWARDS).unwrap();

        let mut previous: Option<ConvexMonotoneInterpolation<'_>> = None;
        for len in 3..=XS.len() {
            let next = factory
                .local_interpolate(&XS[..len], &FORWARDS[..len], 2, previous.as_ref(), XS.len())
                .unwrap();
            previous = Some(next);
        }
        let incremental = previous.unwrap();
        for k in 0..=50 {
            let x = k as Real * 0.1;
            assert!(
                (incremental.operator(x) - full.operator(x)).abs() < 1e-12,
                "x={x}: {} vs {}",
                incremental.operator(x),
                full.operator(x)
            );
        }
        assert_area_preserved(&incremental, &XS, &FORWARDS);
    }

    #[test]
    fn negative_forwards_are_floored_when_forced_positive() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.05, 0.001, 0.06, 0.002];
        let interp = ConvexMonotone::new(0.0, 0.7, true).interpolate(&xs, &ys).unwrap();
        for k in 0..=40 {
            let x = k as Real * 0.1;
            assert!(interp.operator(x) >= -1e-15, "negative value at x={x}");
        }
        assert_area_preserved(&interp, &xs, &ys);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad_m = ConvexMonotone::new(0.3, 1.5, true).interpolate(&XS, &FORWARDS);
        assert_eq!(
            bad_m.unwrap_err(),
            Error::Precondition("Monotonicity must lie between 0 and 1".into())
        );
        let bad_q = ConvexMonotone::new(-0.1, 0.5, true).interpolate(&XS, &FORWARDS);
        assert!(matches!(bad_q, Err(Error::Precondition(_))));
        let single = ConvexMonotone::default().interpolate(&XS[..1], &FORWARDS[..1]);
        assert!(matches!(single, Err(Error::InsufficientData { .. })));

        let full = ConvexMonotone::default().interpolate(&XS, &FORWARDS).unwrap();
        let too_many = ConvexMonotoneInterpolation::new(
            &XS[..3],
            &FORWARDS[..3],
            ConvexMonotone::default(),
            false,
            full.existing_helpers(),
        );
        assert_eq!(
            too_many.unwrap_err(),
            Error::Precondition("Too many existing helpers have been supplied".into())
        );
    }

    #[test]
    fn derivatives_are_not_implemented() {
        let interp = ConvexMonotone::default().interpolate(&XS, &FORWARDS).unwrap();
        assert!(matches!(interp.derivative(1.0), Err(Error::NotImplemented(_))));
        assert!(matches!(
            interp.second_derivative(1.0),
            Err(Error::NotImplemented(_))
        ));
    }
}
