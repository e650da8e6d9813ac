//! Error types for conundrum-rs.
//!
//! A single `thiserror`-derived enum covers every failure the numerical
//! core can report. Precondition checks go through the [`ensure!`] and
//! [`fail!`] macros defined here so that call sites stay one-liners.

use thiserror::Error;

/// The top-level error type used throughout conundrum-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// An operation was requested on a null / unset value, e.g. a pricer
    /// that was never initialised with a coupon.
    #[error("null value: {0}")]
    NullValue(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Too few sample points for the requested construction.
    #[error("{what} requires at least {required} points ({given} are given)")]
    InsufficientData {
        /// The construction that rejected the data.
        what: String,
        /// Minimum number of points needed.
        required: usize,
        /// Number of points supplied.
        given: usize,
    },

    /// A selectable feature exists in the API but has no implementation.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// An iterative method failed to converge.
    #[error("convergence failure: {0}")]
    Convergence(String),
}

/// Shorthand `Result` type used throughout conundrum-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use cn_core::{ensure, errors::Error};
/// fn positive(x: f64) -> cn_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use cn_core::ensure_post;
/// fn price(x: f64) -> cn_core::errors::Result<f64> {
///     let value = x * 2.0;
///     ensure_post!(value >= 0.0, "negative value ({value})");
///     Ok(value)
/// }
/// assert!(price(1.0).is_ok());
/// assert!(price(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use cn_core::fail;
/// fn always_err() -> cn_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
