//! Symmetric unit-variance laws: normal, Student-t and GED.

use std::f64::consts::{LN_2, PI, SQRT_2};

use serde::{Deserialize, Serialize};
use statrs::function::beta::beta_reg;
use statrs::function::erf::{erfc, erfc_inv};
use statrs::function::gamma::{gamma_lr, ln_gamma};

use super::{check_probability, InnovationDistribution};
use crate::error::{ModelError, ModelResult};

/// A symmetric base law that can be skewed.
pub trait SymmetricBase: InnovationDistribution + Clone {
    /// First absolute moment `E|Z|`.
    fn abs_moment(&self) -> f64;
}

/// Standard normal distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardNormal;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

impl InnovationDistribution for StandardNormal {
    fn ln_pdf(&self, z: f64) -> f64 {
        -LN_SQRT_2PI - 0.5 * z * z
    }

    fn cdf(&self, z: f64) -> f64 {
        0.5 * erfc(-z / SQRT_2)
    }

    fn quantile(&self, p: f64) -> ModelResult<f64> {
        check_probability(p)?;
        Ok(-SQRT_2 * erfc_inv(2.0 * p))
    }

    fn tail_expectation(&self, p: f64) -> ModelResult<f64> {
        let q = self.quantile(p)?;
        Ok(self.pdf(q) / (1.0 - p))
    }
}

impl SymmetricBase for StandardNormal {
    fn abs_moment(&self) -> f64 {
        (2.0 / PI).sqrt()
    }
}

/// Student-t rescaled to unit variance, shape `nu > 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizedStudentT {
    nu: f64,
    ln_norm: f64,
}

impl StandardizedStudentT {
    /// Creates the distribution with `nu` degrees of freedom.
    pub fn new(nu: f64) -> ModelResult<Self> {
        if !(nu.is_finite() && nu > 2.0) {
            return Err(ModelError::invalid_input(format!(
                "Student-t shape must exceed 2, got {nu}"
            )));
        }
        let ln_norm =
            ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * (PI * (nu - 2.0)).ln();
        Ok(Self { nu, ln_norm })
    }

    /// Degrees of freedom.
    pub fn shape(&self) -> f64 {
        self.nu
    }
}

impl InnovationDistribution for StandardizedStudentT {
    fn ln_pdf(&self, z: f64) -> f64 {
        self.ln_norm - 0.5 * (self.nu + 1.0) * (z * z / (self.nu - 2.0)).ln_1p()
    }

    fn cdf(&self, z: f64) -> f64 {
        // Classical t variate
        let t = z * (self.nu / (self.nu - 2.0)).sqrt();
        let tail = 0.5 * beta_reg(0.5 * self.nu, 0.5, self.nu / (self.nu + t * t));
        if t > 0.0 {
            1.0 - tail
        } else {
            tail
        }
    }
}

impl SymmetricBase for StandardizedStudentT {
    fn abs_moment(&self) -> f64 {
        let nu = self.nu;
        2.0 * (nu - 2.0).sqrt() / (nu - 1.0)
            * (ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * PI.ln()).exp()
    }
}

/// Generalized error distribution with unit variance, shape `nu > 0`.
///
/// `nu = 2` is the normal law; smaller values give fatter tails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ged {
    nu: f64,
    lambda: f64,
    ln_norm: f64,
}

impl Ged {
    /// Creates the distribution with shape `nu`.
    pub fn new(nu: f64) -> ModelResult<Self> {
        if !(nu.is_finite() && nu > 0.0) {
            return Err(ModelError::invalid_input(format!(
                "GED shape must be positive, got {nu}"
            )));
        }
        let lambda =
            (0.5 * (-2.0 / nu * LN_2 + ln_gamma(1.0 / nu) - ln_gamma(3.0 / nu))).exp();
        let ln_norm = nu.ln() - lambda.ln() - (1.0 + 1.0 / nu) * LN_2 - ln_gamma(1.0 / nu);
        Ok(Self {
            nu,
            lambda,
            ln_norm,
        })
    }

    /// Shape parameter.
    pub fn shape(&self) -> f64 {
        self.nu
    }
}

impl InnovationDistribution for Ged {
    fn ln_pdf(&self, z: f64) -> f64 {
        self.ln_norm - 0.5 * (z.abs() / self.lambda).powf(self.nu)
    }

    fn cdf(&self, z: f64) -> f64 {
        // Half of |z / lambda|^nu is Gamma(1 / nu) distributed
        let w = 0.5 * (z.abs() / self.lambda).powf(self.nu);
        let half = 0.5 * gamma_lr(1.0 / self.nu, w);
        if z >= 0.0 {
            0.5 + half
        } else {
            0.5 - half
        }
    }
}

impl SymmetricBase for Ged {
    fn abs_moment(&self) -> f64 {
        let nu = self.nu;
        self.lambda * (LN_2 / nu + ln_gamma(2.0 / nu) - ln_gamma(1.0 / nu)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_reference_values() {
        let n = StandardNormal;
        assert_relative_eq!(n.cdf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(n.cdf(1.959_963_984_540_054), 0.975, epsilon = 1e-12);
        assert_relative_eq!(n.quantile(0.99).unwrap(), 2.326_347_874_040_841, epsilon = 1e-9);
        assert_relative_eq!(n.pdf(0.0), 0.398_942_280_401_432_7, epsilon = 1e-14);
    }

    #[test]
    fn test_ged_with_shape_two_is_normal() {
        let ged = Ged::new(2.0).unwrap();
        for z in [-2.5, -0.3, 0.0, 1.1, 3.0] {
            assert_relative_eq!(ged.ln_pdf(z), StandardNormal.ln_pdf(z), epsilon = 1e-12);
            assert_relative_eq!(ged.cdf(z), StandardNormal.cdf(z), epsilon = 1e-10);
        }
        assert_relative_eq!(ged.abs_moment(), StandardNormal.abs_moment(), epsilon = 1e-12);
    }

    #[test]
    fn test_student_t_approaches_normal() {
        let t = StandardizedStudentT::new(1e4).unwrap();
        assert_relative_eq!(t.cdf(1.0), StandardNormal.cdf(1.0), epsilon = 1e-4);
        assert_relative_eq!(t.abs_moment(), StandardNormal.abs_moment(), epsilon = 1e-3);
    }

    #[test]
    fn test_student_t_has_fat_tails() {
        let t = StandardizedStudentT::new(4.0).unwrap();
        assert!(t.quantile(0.999).unwrap() > StandardNormal.quantile(0.999).unwrap());
        assert_relative_eq!(t.cdf(0.0), 0.5, epsilon = 1e-14);
        assert_relative_eq!(t.cdf(-0.7) + t.cdf(0.7), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(StandardizedStudentT::new(2.0).is_err());
        assert!(Ged::new(0.0).is_err());
        assert!(Ged::new(f64::NAN).is_err());
    }
}
