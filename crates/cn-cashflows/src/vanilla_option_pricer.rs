//! Vanilla swaption pricers consumed by the Hagan pricers.

use std::fmt;
use std::sync::Arc;

use cn_core::{errors::Result, Rate, Real, Time};
use cn_pricingengines::{black_formula, OptionType};
use cn_termstructures::SwaptionVolatilityStructure;

/// Price of a European option on the swap rate, scaled by a deflator
/// (typically the annuity of the underlying swap).
pub trait VanillaOptionPricer: fmt::Debug {
    /// Option price for `strike`, multiplied by `deflator`.
    fn price(&self, strike: Rate, option_type: OptionType, deflator: Real) -> Result<Real>;
}

/// Black pricer on a fixed forward swap rate, with the variance read from a
/// swaption volatility structure at the strike.
///
/// Corresponds to `QuantLib::BlackVanillaOptionPricer`.
#[derive(Debug, Clone)]
pub struct BlackVanillaOptionPricer {
    forward: Rate,
    option_time: Time,
    swap_length: Time,
    volatility: Arc<dyn SwaptionVolatilityStructure>,
}

impl BlackVanillaOptionPricer {
    /// Pricer on `forward` for options expiring at `option_time` on a swap
    /// of `swap_length` years.
    pub fn new(
        forward: Rate,
        option_time: Time,
        swap_length: Time,
        volatility: Arc<dyn SwaptionVolatilityStructure>,
    ) -> Self {
        Self {
            forward,
            option_time,
            swap_length,
            volatility,
        }
    }

    /// The forward swap rate.
    pub fn forward(&self) -> Rate {
        self.forward
    }

    /// Total Black variance at `strike`.
    pub fn variance(&self, strike: Rate) -> Result<Real> {
        self.volatility
            .black_variance(self.option_time, self.swap_length, strike)
    }
}

impl VanillaOptionPricer for BlackVanillaOptionPricer {
    fn price(&self, strike: Rate, option_type: OptionType, deflator: Real) -> Result<Real> {
        let variance = self.variance(strike)?;
        Ok(deflator * black_formula(option_type, strike, self.forward, variance.sqrt(), 1.0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cn_termstructures::{ConstantSwaptionVolatility, InterpolatedSmileVolatility};

    #[test]
    fn deflated_black_price() {
        let vol = Arc::new(ConstantSwaptionVolatility::new(0.2).unwrap());
        let pricer = BlackVanillaOptionPricer::new(0.05, 1.0, 10.0, vol);
        assert_abs_diff_eq!(pricer.variance(0.03).unwrap(), 0.04, epsilon = 1e-16);
        let price = pricer.price(0.05, OptionType::Call, 2.0).unwrap();
        assert_abs_diff_eq!(price, 2.0 * 0.003_982_783_727_702_899, epsilon = 1e-14);
    }

    #[test]
    fn smile_is_read_at_the_strike() {
        let smile = InterpolatedSmileVolatility::new(
            vec![0.01, 0.03, 0.05, 0.07],
            vec![0.30, 0.25, 0.20, 0.22],
        )
        .unwrap();
        let pricer = BlackVanillaOptionPricer::new(0.05, 4.0, 10.0, Arc::new(smile));
        assert_abs_diff_eq!(pricer.variance(0.03).unwrap(), 0.25 * 0.25 * 4.0, epsilon = 1e-14);
        assert_abs_diff_eq!(pricer.variance(0.09).unwrap(), 0.22 * 0.22 * 4.0, epsilon = 1e-14);
    }

    #[test]
    fn put_call_parity() {
        let vol = Arc::new(ConstantSwaptionVolatility::new(0.25).unwrap());
        let pricer = BlackVanillaOptionPricer::new(0.04, 3.0, 5.0, vol);
        let call = pricer.price(0.035, OptionType::Call, 4.5).unwrap();
        let put = pricer.price(0.035, OptionType::Put, 4.5).unwrap();
        assert_abs_diff_eq!(call - put, 4.5 * (0.04 - 0.035), epsilon = 1e-15);
    }
}
