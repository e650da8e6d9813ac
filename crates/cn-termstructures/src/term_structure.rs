//! `TermStructure` — base trait for all term structures
//! (translates `ql/termstructure.hpp`).
//!
//! Term structures here are queried directly in year fractions measured from
//! the evaluation date, so there is no reference date or day counter: time
//! 0 is "today".

use cn_core::{errors::Result, Time};

/// Base trait for all term structures.
///
/// Corresponds to `QuantLib::TermStructure`.
pub trait TermStructure: std::fmt::Debug + Send + Sync {
    /// The latest time for which the curve can be used.
    fn max_time(&self) -> Time {
        Time::MAX
    }

    /// Whether `t` lies in `[0, max_time()]`.
    fn is_in_range(&self, t: Time) -> bool {
        t >= 0.0 && t <= self.max_time()
    }

    /// Fail with a precondition error when `t` is outside the curve range.
    fn check_range(&self, t: Time) -> Result<()> {
        cn_core::ensure!(t >= 0.0, "negative time ({t}) given");
        cn_core::ensure!(
            t <= self.max_time(),
            "time ({t}) is past max curve time ({})",
            self.max_time()
        );
        Ok(())
    }
}
