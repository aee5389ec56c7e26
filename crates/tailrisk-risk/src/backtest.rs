//! VaR coverage backtests.
//!
//! A day is **covered** when the realized loss does not exceed the VaR
//! forecast (`loss <= VaR`); every other day is an exceedance. For a
//! correctly calibrated model the exceedances are independent Bernoulli
//! draws with probability `alpha`.
//!
//! - Kupiec's proportion-of-failures test checks the exceedance rate
//! - Christoffersen's independence test checks that exceedances do not
//!   cluster; adding it to Kupiec's statistic gives conditional coverage

use serde::{Deserialize, Serialize};
use tailrisk_models::diagnostics::chi_squared_p_value;
use tailrisk_models::TestStatistic;
use tracing::info;

use crate::error::{RiskError, RiskResult};
use crate::forecast::{RollingBacktest, RollingForecast};

/// `n ln(x)`, taken as zero when `n` is zero.
fn xlny(n: usize, x: f64) -> f64 {
    if n == 0 {
        0.0
    } else {
        n as f64 * x.ln()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn check_significance(significance: f64) -> RiskResult<()> {
    if significance > 0.0 && significance < 1.0 {
        Ok(())
    } else {
        Err(RiskError::invalid_input(format!(
            "significance must lie in (0, 1), got {significance}"
        )))
    }
}

fn chi_squared(statistic: f64, degrees_of_freedom: f64) -> RiskResult<TestStatistic> {
    Ok(TestStatistic {
        statistic,
        degrees_of_freedom,
        p_value: chi_squared_p_value(statistic, degrees_of_freedom)?,
    })
}

/// Coverage indicators, `true` when `loss <= var`.
///
/// # Errors
///
/// Fails with [`RiskError::MisalignedSeries`] when the lengths differ.
pub fn coverage_indicators(losses: &[f64], var: &[f64]) -> RiskResult<Vec<bool>> {
    if losses.len() != var.len() {
        return Err(RiskError::misaligned(format!(
            "{} losses against {} forecasts",
            losses.len(),
            var.len()
        )));
    }
    Ok(losses.iter().zip(var).map(|(l, v)| l <= v).collect())
}

/// Kupiec proportion-of-failures test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KupiecTest {
    /// Days tested, `T`.
    pub observations: usize,
    /// Exceedances, `x = T - sum(I)`.
    pub exceedances: usize,
    /// `T * alpha`.
    pub expected_exceedances: f64,
    /// `x / T`.
    pub exceedance_rate: f64,
    /// Likelihood ratio against `chi2(1)`.
    pub pof: TestStatistic,
}

/// Kupiec POF test on coverage indicators.
///
/// ```text
/// POF = 2 [ (T - x) ln((1 - x/T) / (1 - alpha)) + x ln((x/T) / alpha) ]
/// ```
///
/// with `0 ln 0 = 0`.
///
/// # Errors
///
/// Fails for an empty sequence or a significance outside `(0, 1)`.
pub fn kupiec_pof(covered: &[bool], significance: f64) -> RiskResult<KupiecTest> {
    check_significance(significance)?;
    if covered.is_empty() {
        return Err(RiskError::invalid_input("no observations to backtest"));
    }
    let t = covered.len();
    let x = covered.iter().filter(|&&c| !c).count();
    let rate = x as f64 / t as f64;

    let statistic = 2.0
        * (xlny(t - x, (1.0 - rate) / (1.0 - significance)) + xlny(x, rate / significance));

    Ok(KupiecTest {
        observations: t,
        exceedances: x,
        expected_exceedances: t as f64 * significance,
        exceedance_rate: rate,
        pof: chi_squared(statistic.max(0.0), 1.0)?,
    })
}

/// Christoffersen independence and conditional coverage tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChristoffersenTest {
    /// Covered followed by covered.
    pub n00: usize,
    /// Covered followed by exceedance.
    pub n01: usize,
    /// Exceedance followed by covered.
    pub n10: usize,
    /// Exceedance followed by exceedance.
    pub n11: usize,
    /// Independence likelihood ratio against `chi2(1)`.
    pub independence: TestStatistic,
    /// Kupiec plus independence against `chi2(2)`.
    pub conditional_coverage: TestStatistic,
}

/// Christoffersen tests on coverage indicators.
///
/// # Errors
///
/// Fails with fewer than two observations.
pub fn christoffersen(covered: &[bool], significance: f64) -> RiskResult<ChristoffersenTest> {
    if covered.len() < 2 {
        return Err(RiskError::invalid_input(
            "independence test needs at least two observations",
        ));
    }
    let kupiec = kupiec_pof(covered, significance)?;

    let (mut n00, mut n01, mut n10, mut n11) = (0, 0, 0, 0);
    for pair in covered.windows(2) {
        match (!pair[0], !pair[1]) {
            (false, false) => n00 += 1,
            (false, true) => n01 += 1,
            (true, false) => n10 += 1,
            (true, true) => n11 += 1,
        }
    }

    let p01 = ratio(n01, n00 + n01);
    let p11 = ratio(n11, n10 + n11);
    let p = ratio(n01 + n11, n00 + n01 + n10 + n11);

    let restricted = xlny(n00 + n10, 1.0 - p) + xlny(n01 + n11, p);
    let unrestricted =
        xlny(n00, 1.0 - p01) + xlny(n01, p01) + xlny(n10, 1.0 - p11) + xlny(n11, p11);
    let lr_ind = (2.0 * (unrestricted - restricted)).max(0.0);

    Ok(ChristoffersenTest {
        n00,
        n01,
        n10,
        n11,
        independence: chi_squared(lr_ind, 1.0)?,
        conditional_coverage: chi_squared(kupiec.pof.statistic + lr_ind, 2.0)?,
    })
}

/// Backtest report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Significance level `alpha`.
    pub significance: f64,
    /// Kupiec POF test.
    pub kupiec: KupiecTest,
    /// Christoffersen tests, when at least two days were tested.
    pub christoffersen: Option<ChristoffersenTest>,
}

impl BacktestResult {
    /// Whether the POF test rejects correct coverage at `level`.
    pub fn rejects(&self, level: f64) -> bool {
        self.kupiec.pof.rejects(level)
    }
}

/// Runs coverage tests on aligned losses and forecasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backtester {
    significance: f64,
}

impl Backtester {
    /// Creates a backtester for VaR at `significance`.
    pub fn new(significance: f64) -> RiskResult<Self> {
        check_significance(significance)?;
        Ok(Self { significance })
    }

    /// Tests `var[t]` against `losses[t]`.
    ///
    /// # Errors
    ///
    /// Fails with [`RiskError::MisalignedSeries`] when lengths differ.
    pub fn backtest(&self, losses: &[f64], var: &[f64]) -> RiskResult<BacktestResult> {
        let covered = coverage_indicators(losses, var)?;
        self.from_indicators(&covered)
    }

    /// Tests rolling forecasts against the full loss series they came from.
    ///
    /// # Errors
    ///
    /// Fails with [`RiskError::MisalignedSeries`] unless the targets are
    /// consecutive, inside `losses`, and each forecast's realized loss is
    /// the loss at its target.
    pub fn backtest_rolling(
        &self,
        losses: &[f64],
        rolling: &RollingBacktest,
    ) -> RiskResult<BacktestResult> {
        let forecasts: &[RollingForecast] = &rolling.forecasts;
        let first = forecasts
            .first()
            .ok_or_else(|| RiskError::invalid_input("no rolling forecasts"))?
            .target;

        for (i, f) in forecasts.iter().enumerate() {
            if f.target != first + i {
                return Err(RiskError::misaligned(format!(
                    "forecast {i} targets day {}, expected {}",
                    f.target,
                    first + i
                )));
            }
            match losses.get(f.target) {
                Some(&loss) if loss.to_bits() == f.realized.to_bits() => {}
                Some(_) => {
                    return Err(RiskError::misaligned(format!(
                        "realized loss of day {} differs from the loss series",
                        f.target
                    )))
                }
                None => {
                    return Err(RiskError::misaligned(format!(
                        "day {} is beyond the {} losses",
                        f.target,
                        losses.len()
                    )))
                }
            }
        }

        let realized = &losses[first..first + forecasts.len()];
        self.backtest(realized, &rolling.var())
    }

    fn from_indicators(&self, covered: &[bool]) -> RiskResult<BacktestResult> {
        let kupiec = kupiec_pof(covered, self.significance)?;
        let christoffersen = if covered.len() >= 2 {
            Some(christoffersen(covered, self.significance)?)
        } else {
            None
        };
        info!(
            days = kupiec.observations,
            exceedances = kupiec.exceedances,
            expected = kupiec.expected_exceedances,
            p_value = kupiec.pof.p_value,
            "VaR backtest"
        );
        Ok(BacktestResult {
            significance: self.significance,
            kupiec,
            christoffersen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn with_exceedances(t: usize, x: usize) -> Vec<bool> {
        // Spread exceedances evenly
        (0..t).map(|i| (i * x) / t == ((i + 1) * x) / t).collect()
    }

    #[test]
    fn test_indicator_convention() {
        let covered = coverage_indicators(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(covered, vec![true, true, false]);
        assert!(matches!(
            coverage_indicators(&[1.0], &[1.0, 2.0]),
            Err(RiskError::MisalignedSeries(_))
        ));
    }

    #[test]
    fn test_kupiec_accepts_near_nominal_rate() {
        let covered = with_exceedances(1257, 13);
        let test = kupiec_pof(&covered, 0.01).unwrap();
        assert_eq!(test.exceedances, 13);
        assert_relative_eq!(test.expected_exceedances, 12.57, epsilon = 1e-10);
        assert!(test.pof.p_value > 0.05, "p = {}", test.pof.p_value);
    }

    #[test]
    fn test_kupiec_rejects_excess_exceedances() {
        let covered = with_exceedances(1257, 50);
        let test = kupiec_pof(&covered, 0.01).unwrap();
        assert_eq!(test.exceedances, 50);
        assert!(test.pof.p_value < 0.01, "p = {}", test.pof.p_value);
    }

    #[test]
    fn test_kupiec_edge_counts() {
        // No exceedances: only the covered term survives
        let none = kupiec_pof(&[true; 100], 0.01).unwrap();
        assert_relative_eq!(none.pof.statistic, -200.0 * 0.99f64.ln(), epsilon = 1e-12);

        // Only exceedances: only the exceedance term survives
        let all = kupiec_pof(&[false; 10], 0.05).unwrap();
        assert_relative_eq!(all.pof.statistic, 20.0 * 20f64.ln(), epsilon = 1e-12);

        assert!(kupiec_pof(&[], 0.01).is_err());
        assert!(kupiec_pof(&[true], 0.0).is_err());
    }

    #[test]
    fn test_christoffersen_detects_clustering() {
        let mut clustered = vec![true; 500];
        for c in clustered.iter_mut().skip(200).take(10) {
            *c = false;
        }
        let spread = with_exceedances(500, 10);

        let clustered = christoffersen(&clustered, 0.02).unwrap();
        let spread = christoffersen(&spread, 0.02).unwrap();
        assert_eq!(clustered.n11, 9);
        assert_eq!(spread.n11, 0);
        assert!(clustered.independence.p_value < 0.01);
        assert!(spread.independence.p_value > 0.05);
        assert_relative_eq!(
            clustered.conditional_coverage.statistic,
            kupiec_pof(&with_exceedances(500, 10), 0.02).unwrap().pof.statistic
                + clustered.independence.statistic,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_backtester() {
        let losses = [0.5, 1.5, -0.2, 3.0];
        let var = [1.0, 1.0, 1.0, 1.0];
        let result = Backtester::new(0.05).unwrap().backtest(&losses, &var).unwrap();
        assert_eq!(result.kupiec.exceedances, 2);
        assert!(result.christoffersen.is_some());

        let single = Backtester::new(0.05).unwrap().backtest(&[2.0], &[1.0]).unwrap();
        assert!(single.christoffersen.is_none());
    }

    proptest! {
        #[test]
        fn prop_pof_statistic_is_a_valid_test(
            covered in proptest::collection::vec(any::<bool>(), 1..400),
            significance in 0.001f64..0.2,
        ) {
            let test = kupiec_pof(&covered, significance).unwrap();
            prop_assert_eq!(test.exceedances, covered.iter().filter(|c| !**c).count());
            prop_assert!(test.pof.statistic >= -1e-9);
            prop_assert!((0.0..=1.0).contains(&test.pof.p_value));
        }
    }
}
