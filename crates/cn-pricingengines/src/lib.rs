//! # cn-pricingengines
//!
//! Closed-form pricing primitives.
//!
//! ## Formulas
//!
//! - [`black_formula`] — Black 1976 price of a call or put on a lognormal
//!   forward, the building block of the CMS vanilla option pricer

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_formula;

pub use black_formula::{black_formula, OptionType};
