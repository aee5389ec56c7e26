//! Information criteria.
//!
//! Unnormalized forms, smaller is better:
//!
//! | Criterion | Formula |
//! |-----------|---------|
//! | AIC  | `-2 LL + 2k` |
//! | AICC | `AIC + 2k(k+1) / (N - k - 1)` |
//! | SBC  | `-2 LL + k ln N` |
//! | HQC  | `-2 LL + 2k ln ln N` |

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Information criteria of one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InformationCriteria {
    /// Log-likelihood.
    pub log_likelihood: f64,
    /// Number of estimated parameters `k`.
    pub num_params: usize,
    /// Sample size `N`.
    pub num_obs: usize,
    /// Akaike.
    pub aic: f64,
    /// Small-sample corrected Akaike.
    pub aicc: f64,
    /// Schwarz-Bayesian.
    pub sbc: f64,
    /// Hannan-Quinn.
    pub hqc: f64,
}

impl InformationCriteria {
    /// Computes all criteria.
    ///
    /// # Errors
    ///
    /// Fails unless `N > k + 1` (the AICC correction is undefined otherwise)
    /// and `N >= 3` (so that `ln ln N > 0`).
    pub fn new(log_likelihood: f64, num_params: usize, num_obs: usize) -> ModelResult<Self> {
        if num_obs <= num_params + 1 || num_obs < 3 {
            return Err(ModelError::InsufficientData {
                required: (num_params + 2).max(3),
                actual: num_obs,
            });
        }
        if !log_likelihood.is_finite() {
            return Err(ModelError::invalid_input("log-likelihood is not finite"));
        }

        let k = num_params as f64;
        let n = num_obs as f64;
        let deviance = -2.0 * log_likelihood;
        let aic = deviance + 2.0 * k;

        Ok(Self {
            log_likelihood,
            num_params,
            num_obs,
            aic,
            aicc: aic + 2.0 * k * (k + 1.0) / (n - k - 1.0),
            sbc: deviance + k * n.ln(),
            hqc: deviance + 2.0 * k * n.ln().ln(),
        })
    }

    /// Orders by AICC, then SBC, then HQC.
    pub fn selection_order(&self, other: &Self) -> Ordering {
        self.aicc
            .total_cmp(&other.aicc)
            .then(self.sbc.total_cmp(&other.sbc))
            .then(self.hqc.total_cmp(&other.hqc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_formulas() {
        let ic = InformationCriteria::new(-100.0, 3, 50).unwrap();
        assert_relative_eq!(ic.aic, 206.0);
        assert_relative_eq!(ic.aicc, 206.0 + 24.0 / 46.0, epsilon = 1e-12);
        assert_relative_eq!(ic.sbc, 200.0 + 3.0 * 50f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(ic.hqc, 200.0 + 6.0 * 50f64.ln().ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_aicc_penalty_difference() {
        let n = 1257;
        let small = InformationCriteria::new(-1800.0, 1, n).unwrap();
        let large = InformationCriteria::new(-1800.0, 3, n).unwrap();
        let expected = 4.0 + 24.0 / 1253.0 - 4.0 / 1255.0;
        assert_relative_eq!(large.aicc - small.aicc, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_requires_enough_observations() {
        assert!(InformationCriteria::new(-1.0, 3, 4).is_err());
        assert!(InformationCriteria::new(-1.0, 3, 5).is_ok());
        assert!(InformationCriteria::new(f64::NAN, 1, 50).is_err());
    }

    #[test]
    fn test_selection_order_tie_breaks() {
        let a = InformationCriteria {
            log_likelihood: 0.0,
            num_params: 1,
            num_obs: 10,
            aic: 0.0,
            aicc: 1.0,
            sbc: 2.0,
            hqc: 3.0,
        };
        let b = InformationCriteria { sbc: 1.5, ..a };
        assert_eq!(a.selection_order(&b), Ordering::Greater);
        assert_eq!(a.selection_order(&a), Ordering::Equal);
    }

    proptest! {
        #[test]
        fn prop_aicc_penalizes_more_than_aic(
            ll in -1.0e5f64..1.0e3,
            k in 1usize..12,
            extra in 2usize..5_000,
        ) {
            let ic = InformationCriteria::new(ll, k, k + extra).unwrap();
            prop_assert!(ic.aicc > ic.aic);
            prop_assert!(ic.aic > -2.0 * ll);
        }
    }
}
