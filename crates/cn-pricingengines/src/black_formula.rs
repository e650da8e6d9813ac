//! Black 1976 formula (translates `ql/pricingengines/blackformula.hpp`).
//!
//! Prices a European option on a lognormal forward given the total standard
//! deviation `σ·√T` and a discount (or annuity) multiplier:
//!
//! $$C = D\,[F N(d_1) - K N(d_2)]$$
//! $$P = D\,[K N(-d_2) - F N(-d_1)]$$
//!
//! with $d_{1,2} = \ln(F/K)/s \pm s/2$.

use std::fmt;

use cn_core::{errors::Result, Real};
use cn_math::distributions::normal_cdf;

/// The type of a vanilla option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionType {
    /// A call option (right to buy).
    Call,
    /// A put option (right to sell).
    Put,
}

impl OptionType {
    /// +1 for Call, −1 for Put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Black formula price of an option on `forward` struck at `strike`.
///
/// A zero standard deviation gives the discounted intrinsic value, and a
/// zero strike gives the discounted forward for a call (zero for a put).
///
/// # Errors
/// [`Error::Precondition`](cn_core::Error::Precondition) for a negative
/// strike or standard deviation, a non-positive forward or a non-positive
/// discount.
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
) -> Result<Real> {
    cn_core::ensure!(strike >= 0.0, "strike ({strike}) must be non-negative");
    cn_core::ensure!(forward > 0.0, "forward ({forward}) must be positive");
    cn_core::ensure!(std_dev >= 0.0, "stdDev ({std_dev}) must be non-negative");
    cn_core::ensure!(discount > 0.0, "discount ({discount}) must be positive");

    let phi = option_type.sign();
    if std_dev == 0.0 {
        return Ok((phi * (forward - strike)).max(0.0) * discount);
    }
    if strike == 0.0 {
        return Ok(match option_type {
            OptionType::Call => forward * discount,
            OptionType::Put => 0.0,
        });
    }

    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let result = discount * phi * (forward * normal_cdf(phi * d1) - strike * normal_cdf(phi * d2));
    // numerical noise can push deep out-of-the-money prices below zero
    Ok(result.max(0.0))
}
