//! Integrand of the numeric Hagan replication.
//!
//! With `F(x) = (x - K) (G(x)/G(R) - 1)` the CMS optionlet struck at `K` is
//! replicated by swaptions (Hagan, "Convexity conundrums", 2.17a/2.18a):
//!
//! $$\frac{D}{A}\Big[(1 + F'(K))\,C(K) \pm \int C(x)\,F''(x)\,dx\Big]$$
//!
//! where `C(x)` is the annuity-deflated swaption price struck at `x`.

use cn_core::{errors::Result, Rate, Real};
use cn_pricingengines::OptionType;

use crate::g_function::GFunction;
use crate::vanilla_option_pricer::VanillaOptionPricer;

/// `x ↦ C(x) F''(x)` for one strike, option type and `G` function.
#[derive(Debug, Clone, Copy)]
pub struct ConundrumIntegrand<'a> {
    vanilla_option_pricer: &'a dyn VanillaOptionPricer,
    g_function: &'a dyn GFunction,
    annuity: Real,
    forward_value: Rate,
    strike: Rate,
    option_type: OptionType,
}

impl<'a> ConundrumIntegrand<'a> {
    /// Integrand for an optionlet struck at `strike` on a swap rate with
    /// forward `forward_value`.
    pub fn new(
        vanilla_option_pricer: &'a dyn VanillaOptionPricer,
        g_function: &'a dyn GFunction,
        annuity: Real,
        forward_value: Rate,
        strike: Rate,
        option_type: OptionType,
    ) -> Self {
        Self {
            vanilla_option_pricer,
            g_function,
            annuity,
            forward_value,
            strike,
            option_type,
        }
    }

    /// Strike of the replicated optionlet.
    pub fn strike(&self) -> Rate {
        self.strike
    }

    /// Annuity used as swaption deflator.
    pub fn annuity(&self) -> Real {
        self.annuity
    }

    /// `C(x) F''(x)`.
    pub fn value(&self, x: Real) -> Result<Real> {
        let option = self
            .vanilla_option_pricer
            .price(x, self.option_type, self.annuity)?;
        Ok(option * self.second_derivative_of_f(x)?)
    }

    /// `F(x)`.
    pub fn function_f(&self, x: Real) -> Result<Real> {
        let gx = self.g_function.value(x)?;
        let gr = self.g_function.value(self.forward_value)?;
        Ok((x - self.strike) * (gx / gr - 1.0))
    }

    /// `F'(x)`.
    pub fn first_derivative_of_f(&self, x: Real) -> Result<Real> {
        let gx = self.g_function.value(x)?;
        let gr = self.g_function.value(self.forward_value)?;
        let g1 = self.g_function.first_derivative(x)?;
        Ok((gx / gr - 1.0) + g1 / gr * (x - self.strike))
    }

    /// `F''(x)`.
    pub fn second_derivative_of_f(&self, x: Real) -> Result<Real> {
        let gr = self.g_function.value(self.forward_value)?;
        let g1 = self.g_function.first_derivative(x)?;
        let g2 = self.g_function.second_derivative(x)?;
        Ok(2.0 * g1 / gr + (x - self.strike) * g2 / gr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_function::GFunctionStandard;
    use crate::vanilla_option_pricer::BlackVanillaOptionPricer;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use cn_termstructures::ConstantSwaptionVolatility;
    use std::sync::Arc;

    fn setup() -> (BlackVanillaOptionPricer, GFunctionStandard) {
        let vol = Arc::new(ConstantSwaptionVolatility::new(0.15).unwrap());
        (
            BlackVanillaOptionPricer::new(0.04, 5.0, 10.0, vol),
            GFunctionStandard::new(2, 1.0, 10.0).unwrap(),
        )
    }

    #[test]
    fn f_vanishes_at_the_strike_and_forward() {
        let (vanilla, g) = setup();
        let integrand = ConundrumIntegrand::new(&vanilla, &g, 6.7, 0.04, 0.03, OptionType::Call);
        assert_eq!(integrand.function_f(0.03).unwrap(), 0.0);
        assert_abs_diff_eq!(integrand.function_f(0.04).unwrap(), 0.0, epsilon = 1e-17);
        // F'(K) reduces to G(K)/G(R) - 1
        let expected = g.value(0.03).unwrap() / g.value(0.04).unwrap() - 1.0;
        assert_abs_diff_eq!(integrand.first_derivative_of_f(0.03).unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn derivatives_of_f_match_finite_differences() {
        let (vanilla, g) = setup();
        let integrand = ConundrumIntegrand::new(&vanilla, &g, 6.7, 0.04, 0.03, OptionType::Put);
        let h = 1e-5;
        for x in [0.01, 0.06, 0.09] {
            let d1 = (integrand.function_f(x + h).unwrap() - integrand.function_f(x - h).unwrap())
                / (2.0 * h);
            let d2 = (integrand.first_derivative_of_f(x + h).unwrap()
                - integrand.first_derivative_of_f(x - h).unwrap())
                / (2.0 * h);
            assert_relative_eq!(integrand.first_derivative_of_f(x).unwrap(), d1, max_relative = 1e-6);
            assert_relative_eq!(integrand.second_derivative_of_f(x).unwrap(), d2, max_relative = 1e-5);
        }
    }

    #[test]
    fn value_weights_the_deflated_swaption() {
        let (vanilla, g) = setup();
        let integrand = ConundrumIntegrand::new(&vanilla, &g, 6.7, 0.04, 0.03, OptionType::Call);
        let x = 0.05;
        let swaption = vanilla.price(x, OptionType::Call, 6.7).unwrap();
        assert_relative_eq!(
            integrand.value(x).unwrap(),
            swaption * integrand.second_derivative_of_f(x).unwrap(),
            max_relative = 1e-15
        );
        assert_eq!(integrand.strike(), 0.03);
        assert_eq!(integrand.annuity(), 6.7);
    }
}
