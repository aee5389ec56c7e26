//! Fernandez-Steel skewing of a symmetric base law.
//!
//! The raw skewed variable has density `g * f(z / xi)` for `z >= 0` and
//! `g * f(z * xi)` for `z < 0`, with `g = 2 / (xi + 1 / xi)`. It is then
//! recentred and rescaled to zero mean and unit variance using the base's
//! first absolute moment `m1`:
//!
//! ```text
//! mu    = m1 * (xi - 1 / xi)
//! sigma = sqrt((1 - m1^2) * (xi^2 + xi^-2) + 2 m1^2 - 1)
//! ```

use serde::{Deserialize, Serialize};

use super::symmetric::SymmetricBase;
use super::InnovationDistribution;
use crate::error::{ModelError, ModelResult};

/// A skewed, standardized version of `B`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Skewed<B> {
    base: B,
    xi: f64,
    mu: f64,
    sigma: f64,
    g: f64,
}

impl<B: SymmetricBase> Skewed<B> {
    /// Skews `base` by `xi > 0`; `xi > 1` puts more mass on the right.
    pub fn new(base: B, xi: f64) -> ModelResult<Self> {
        if !(xi.is_finite() && xi > 0.0) {
            return Err(ModelError::invalid_input(format!(
                "skew must be positive, got {xi}"
            )));
        }
        let m1 = base.abs_moment();
        let inv = 1.0 / xi;
        let mu = m1 * (xi - inv);
        let sigma = ((1.0 - m1 * m1) * (xi * xi + inv * inv) + 2.0 * m1 * m1 - 1.0).sqrt();
        Ok(Self {
            base,
            xi,
            mu,
            sigma,
            g: 2.0 / (xi + inv),
        })
    }

    /// Skew parameter.
    pub fn skew(&self) -> f64 {
        self.xi
    }

    /// The symmetric base law.
    pub fn base(&self) -> &B {
        &self.base
    }

    fn raw(&self, x: f64) -> f64 {
        x * self.sigma + self.mu
    }
}

impl<B: SymmetricBase> InnovationDistribution for Skewed<B> {
    fn ln_pdf(&self, x: f64) -> f64 {
        let z = self.raw(x);
        let scaled = if z >= 0.0 { z / self.xi } else { z * self.xi };
        self.g.ln() + self.base.ln_pdf(scaled) + self.sigma.ln()
    }

    fn cdf(&self, x: f64) -> f64 {
        let z = self.raw(x);
        if z >= 0.0 {
            1.0 - self.g * self.xi * self.base.cdf(-z / self.xi)
        } else {
            self.g / self.xi * self.base.cdf(z * self.xi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{StandardNormal, StandardizedStudentT};
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_skew_is_the_base() {
        let base = StandardizedStudentT::new(6.0).unwrap();
        let skewed = Skewed::new(base, 1.0).unwrap();
        for z in [-3.0, -0.5, 0.0, 0.8, 2.2] {
            assert_relative_eq!(skewed.ln_pdf(z), base.ln_pdf(z), epsilon = 1e-12);
            assert_relative_eq!(skewed.cdf(z), base.cdf(z), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cdf_is_continuous_at_mode() {
        let skewed = Skewed::new(StandardNormal, 1.7).unwrap();
        let mode = -skewed.mu / skewed.sigma;
        let left = skewed.cdf(mode - 1e-10);
        let right = skewed.cdf(mode + 1e-10);
        assert_relative_eq!(left, right, epsilon = 1e-8);
        assert_relative_eq!(right, 1.0 / (1.0 + 1.7 * 1.7), epsilon = 1e-8);
    }

    #[test]
    fn test_right_skew_fattens_upper_tail() {
        let right = Skewed::new(StandardNormal, 1.5).unwrap();
        let left = Skewed::new(StandardNormal, 1.0 / 1.5).unwrap();
        let q_right = right.quantile(0.99).unwrap();
        let q_left = left.quantile(0.99).unwrap();
        assert!(q_right > q_left);
        // Mirror images
        assert_relative_eq!(right.quantile(0.01).unwrap(), -q_left, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_skew() {
        assert!(Skewed::new(StandardNormal, 0.0).is_err());
        assert!(Skewed::new(StandardNormal, -1.0).is_err());
    }
}
