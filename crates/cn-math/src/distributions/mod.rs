//! Probability distributions (translates `ql/math/distributions/`).
//!
//! Only the standard normal is needed by the pricing code; the special
//! functions are delegated to the `statrs` crate.

pub mod normal;

pub use normal::{normal_cdf, normal_pdf};
