//! Standardized innovation distributions.
//!
//! Every distribution here has zero mean and unit variance, so a GARCH shock
//! is `a_t = sigma_t * z_t` with `z_t` drawn from one of them. Estimators and
//! forecasters only see the [`InnovationDistribution`] trait; [`Innovation`]
//! builds the right implementation from a [`DistributionFamily`] and its
//! shape/skew parameters.

mod skewed;
mod symmetric;

pub use skewed::Skewed;
pub use symmetric::{Ged, StandardNormal, StandardizedStudentT, SymmetricBase};

use tailrisk_core::DistributionFamily;
use tailrisk_math::solvers::{brent, expand_bracket, SolverConfig};

use crate::error::{ModelError, ModelResult};

/// Lowest admissible Student-t shape.
pub const STUDENT_T_SHAPE_MIN: f64 = 2.1;
/// Highest admissible Student-t shape.
pub const STUDENT_T_SHAPE_MAX: f64 = 100.0;
/// Lowest admissible GED shape.
pub const GED_SHAPE_MIN: f64 = 0.3;
/// Highest admissible GED shape.
pub const GED_SHAPE_MAX: f64 = 50.0;
/// Lowest admissible skew.
pub const SKEW_MIN: f64 = 0.1;
/// Highest admissible skew.
pub const SKEW_MAX: f64 = 10.0;

const TAIL_INTEGRATION_INTERVALS: usize = 2_000;

/// Log-density, CDF, quantile and tail expectation of a standardized law.
pub trait InnovationDistribution: Send + Sync {
    /// Natural log of the density at `z`.
    fn ln_pdf(&self, z: f64) -> f64;

    /// Cumulative distribution function.
    fn cdf(&self, z: f64) -> f64;

    /// Density at `z`.
    fn pdf(&self, z: f64) -> f64 {
        self.ln_pdf(z).exp()
    }

    /// Quantile function, found by root finding on the CDF unless overridden.
    fn quantile(&self, p: f64) -> ModelResult<f64> {
        check_probability(p)?;
        let objective = |z: f64| self.cdf(z) - p;
        let (lo, hi) = expand_bracket(&objective, -1.0, 1.0, 60)?;
        Ok(brent(objective, lo, hi, &SolverConfig::default())?.root)
    }

    /// Conditional mean of the upper tail, `E[Z | Z > q_p]`.
    fn tail_expectation(&self, p: f64) -> ModelResult<f64> {
        let q = self.quantile(p)?;
        Ok(upper_partial_moment(|z| self.pdf(z), q) / (1.0 - p))
    }
}

/// `int_q^inf z f(z) dz` by Simpson's rule after mapping `[q, inf)` onto
/// `[0, 1)` through `z = q + t / (1 - t)`.
pub(crate) fn upper_partial_moment<F: Fn(f64) -> f64>(pdf: F, q: f64) -> f64 {
    let n = TAIL_INTEGRATION_INTERVALS;
    let h = 1.0 / n as f64;
    let integrand = |t: f64| {
        if t >= 1.0 {
            return 0.0;
        }
        let one_minus = 1.0 - t;
        let z = q + t / one_minus;
        let value = z * pdf(z) / (one_minus * one_minus);
        if value.is_finite() {
            value
        } else {
            0.0
        }
    };

    let mut sum = integrand(0.0) + integrand(1.0);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * integrand(i as f64 * h);
    }
    sum * h / 3.0
}

pub(crate) fn check_probability(p: f64) -> ModelResult<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(ModelError::invalid_input(format!(
            "probability {p} outside (0, 1)"
        )))
    }
}

/// Innovation distribution selected by family.
#[derive(Debug, Clone, PartialEq)]
pub enum Innovation {
    /// Standard normal.
    Normal(StandardNormal),
    /// Unit-variance Student-t.
    StudentT(StandardizedStudentT),
    /// Unit-variance GED.
    Ged(Ged),
    /// Skewed normal.
    SkewNormal(Skewed<StandardNormal>),
    /// Skewed Student-t.
    SkewStudentT(Skewed<StandardizedStudentT>),
    /// Skewed GED.
    SkewGed(Skewed<Ged>),
}

impl Innovation {
    /// Builds the distribution for `family`.
    ///
    /// `shape` is required for families with a shape parameter and `skew`
    /// for the skewed families; both are ignored otherwise.
    pub fn new(
        family: DistributionFamily,
        shape: Option<f64>,
        skew: Option<f64>,
    ) -> ModelResult<Self> {
        let need_shape = || {
            shape.ok_or_else(|| ModelError::invalid_input(format!("{family} requires a shape")))
        };
        let need_skew = || {
            skew.ok_or_else(|| ModelError::invalid_input(format!("{family} requires a skew")))
        };

        Ok(match family {
            DistributionFamily::Normal => Self::Normal(StandardNormal),
            DistributionFamily::StudentT => {
                Self::StudentT(StandardizedStudentT::new(need_shape()?)?)
            }
            DistributionFamily::Ged => Self::Ged(Ged::new(need_shape()?)?),
            DistributionFamily::SkewNormal => {
                Self::SkewNormal(Skewed::new(StandardNormal, need_skew()?)?)
            }
            DistributionFamily::SkewStudentT => Self::SkewStudentT(Skewed::new(
                StandardizedStudentT::new(need_shape()?)?,
                need_skew()?,
            )?),
            DistributionFamily::SkewGed => {
                Self::SkewGed(Skewed::new(Ged::new(need_shape()?)?, need_skew()?)?)
            }
        })
    }

    /// Family of this distribution.
    pub fn family(&self) -> DistributionFamily {
        match self {
            Self::Normal(_) => DistributionFamily::Normal,
            Self::StudentT(_) => DistributionFamily::StudentT,
            Self::Ged(_) => DistributionFamily::Ged,
            Self::SkewNormal(_) => DistributionFamily::SkewNormal,
            Self::SkewStudentT(_) => DistributionFamily::SkewStudentT,
            Self::SkewGed(_) => DistributionFamily::SkewGed,
        }
    }

    fn inner(&self) -> &dyn InnovationDistribution {
        match self {
            Self::Normal(d) => d,
            Self::StudentT(d) => d,
            Self::Ged(d) => d,
            Self::SkewNormal(d) => d,
            Self::SkewStudentT(d) => d,
            Self::SkewGed(d) => d,
        }
    }
}

impl InnovationDistribution for Innovation {
    fn ln_pdf(&self, z: f64) -> f64 {
        self.inner().ln_pdf(z)
    }

    fn cdf(&self, z: f64) -> f64 {
        self.inner().cdf(z)
    }

    fn quantile(&self, p: f64) -> ModelResult<f64> {
        self.inner().quantile(p)
    }

    fn tail_expectation(&self, p: f64) -> ModelResult<f64> {
        self.inner().tail_expectation(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// First three moments by the trapezoid rule on a wide grid.
    fn moments(dist: &dyn InnovationDistribution) -> (f64, f64, f64) {
        let (lo, hi, n) = (-40.0, 40.0, 160_000);
        let h = (hi - lo) / n as f64;
        let (mut m0, mut m1, mut m2) = (0.0, 0.0, 0.0);
        for i in 0..=n {
            let z = lo + i as f64 * h;
            let w = if i == 0 || i == n { 0.5 } else { 1.0 };
            let f = dist.pdf(z) * w * h;
            m0 += f;
            m1 += z * f;
            m2 += z * z * f;
        }
        (m0, m1, m2)
    }

    fn all_families() -> Vec<Innovation> {
        DistributionFamily::ALL
            .iter()
            .map(|&family| Innovation::new(family, Some(8.0), Some(1.4)).unwrap())
            .collect()
    }

    #[test]
    fn test_densities_are_standardized() {
        for dist in all_families() {
            let (mass, mean, second) = moments(&dist);
            assert_relative_eq!(mass, 1.0, epsilon = 1e-4);
            assert_relative_eq!(mean, 0.0, epsilon = 1e-4);
            assert_relative_eq!(second, 1.0, epsilon = 2e-3);
        }
    }

    #[test]
    fn test_quantile_inverts_cdf() {
        for dist in all_families() {
            for p in [0.01, 0.3, 0.5, 0.95, 0.999] {
                let q = dist.quantile(p).unwrap();
                assert_relative_eq!(dist.cdf(q), p, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_tail_expectation_exceeds_quantile() {
        for dist in all_families() {
            let q = dist.quantile(0.99).unwrap();
            let es = dist.tail_expectation(0.99).unwrap();
            assert!(es > q, "{:?}: es {es} <= q {q}", dist.family());
        }
    }

    #[test]
    fn test_numeric_tail_expectation_matches_normal_closed_form() {
        let q = StandardNormal.quantile(0.975).unwrap();
        let numeric = upper_partial_moment(|z| StandardNormal.pdf(z), q) / 0.025;
        assert_relative_eq!(
            numeric,
            StandardNormal.tail_expectation(0.975).unwrap(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_missing_parameters() {
        assert!(Innovation::new(DistributionFamily::StudentT, None, None).is_err());
        assert!(Innovation::new(DistributionFamily::SkewNormal, None, None).is_err());
        assert!(Innovation::new(DistributionFamily::Normal, None, None).is_ok());
        assert!(StandardNormal.quantile(1.0).is_err());
    }
}
