//! Conditional mean and variance recursions.

use tailrisk_core::ModelSpec;

use super::params::GarchParameters;
use crate::distributions::InnovationDistribution;

/// Output of one pass of the ARMA-GARCH filter over a series.
#[derive(Debug, Clone)]
pub(crate) struct FilterPass {
    pub conditional_mean: Vec<f64>,
    pub residuals: Vec<f64>,
    pub conditional_variance: Vec<f64>,
    /// `NaN` when some variance was non-positive or a density non-finite.
    pub log_likelihood: f64,
}

/// Runs the filter over `data`.
///
/// Pre-sample mean deviations and shocks are zero. The first
/// `max(r, s)` variances are set to `seed_variance`.
pub(crate) fn run<D: InnovationDistribution + ?Sized>(
    spec: &ModelSpec,
    params: &GarchParameters,
    innovation: &D,
    data: &[f64],
    seed_variance: f64,
) -> FilterPass {
    let n = data.len();
    let burn_in = spec.variance_burn_in();
    let mut conditional_mean = Vec::with_capacity(n);
    let mut residuals: Vec<f64> = Vec::with_capacity(n);
    let mut conditional_variance: Vec<f64> = Vec::with_capacity(n);
    let mut log_likelihood = 0.0;

    for t in 0..n {
        let mut m = params.mu;
        for (i, phi) in params.ar.iter().enumerate() {
            if let Some(lag) = t.checked_sub(i + 1) {
                m += phi * (data[lag] - params.mu);
            }
        }
        for (j, theta) in params.ma.iter().enumerate() {
            if let Some(lag) = t.checked_sub(j + 1) {
                m += theta * residuals[lag];
            }
        }
        let a = data[t] - m;

        let h = if t < burn_in {
            seed_variance
        } else {
            let mut h = params.omega;
            for (i, alpha) in params.alpha.iter().enumerate() {
                let shock = residuals[t - i - 1];
                h += alpha * shock * shock;
            }
            for (j, beta) in params.beta.iter().enumerate() {
                h += beta * conditional_variance[t - j - 1];
            }
            h
        };

        conditional_mean.push(m);
        residuals.push(a);
        conditional_variance.push(h);

        if !(h > 0.0 && h.is_finite()) {
            log_likelihood = f64::NAN;
            continue;
        }
        log_likelihood += innovation.ln_pdf(a / h.sqrt()) - 0.5 * h.ln();
    }

    if !log_likelihood.is_finite() {
        log_likelihood = f64::NAN;
    }

    FilterPass {
        conditional_mean,
        residuals,
        conditional_variance,
        log_likelihood,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::StandardNormal;
    use approx::assert_relative_eq;
    use tailrisk_core::DistributionFamily;

    #[test]
    fn test_garch11_recursion_by_hand() {
        let spec = ModelSpec::new(0, 0, 1, 1, DistributionFamily::Normal).with_mean(false);
        let params = GarchParameters::from_vector(&spec, &[0.1, 0.2, 0.7]).unwrap();
        let data = [1.0, -2.0, 0.5];
        let pass = run(&spec, &params, &StandardNormal, &data, 1.5);

        assert_eq!(pass.conditional_variance[0], 1.5);
        let h1 = 0.1 + 0.2 * 1.0 + 0.7 * 1.5;
        let h2 = 0.1 + 0.2 * 4.0 + 0.7 * h1;
        assert_relative_eq!(pass.conditional_variance[1], h1, epsilon = 1e-14);
        assert_relative_eq!(pass.conditional_variance[2], h2, epsilon = 1e-14);

        let expected: f64 = data
            .iter()
            .zip(&pass.conditional_variance)
            .map(|(a, h)| StandardNormal.ln_pdf(a / h.sqrt()) - 0.5 * h.ln())
            .sum();
        assert_relative_eq!(pass.log_likelihood, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_arma_mean_recursion() {
        // mu = 1, phi = 0.5, theta = 0.25
        let spec = ModelSpec::new(1, 1, 1, 0, DistributionFamily::Normal);
        let params =
            GarchParameters::from_vector(&spec, &[1.0, 0.5, 0.25, 1.0, 0.0]).unwrap();
        let data = [2.0, 0.0, 1.0];
        let pass = run(&spec, &params, &StandardNormal, &data, 1.0);

        assert_eq!(pass.conditional_mean[0], 1.0);
        assert_eq!(pass.residuals[0], 1.0);
        // 1 + 0.5 * (2 - 1) + 0.25 * 1
        assert_relative_eq!(pass.conditional_mean[1], 1.75);
        assert_relative_eq!(pass.residuals[1], -1.75);
        // 1 + 0.5 * (0 - 1) + 0.25 * (-1.75)
        assert_relative_eq!(pass.conditional_mean[2], 0.0625);
    }

    #[test]
    fn test_negative_variance_poisons_likelihood() {
        let spec = ModelSpec::new(0, 0, 1, 0, DistributionFamily::Normal).with_mean(false);
        let params = GarchParameters::from_vector(&spec, &[-1.0, 0.1]).unwrap();
        let pass = run(&spec, &params, &StandardNormal, &[0.1, 0.1, 0.1], 1.0);
        assert!(pass.log_likelihood.is_nan());
    }
}
