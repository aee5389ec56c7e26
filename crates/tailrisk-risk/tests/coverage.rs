//! Coverage tests against forecasts with known calibration.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use tailrisk_config::WindowKind;
use tailrisk_core::{DistributionFamily, ModelSpec};
use tailrisk_risk::prelude::*;
use tailrisk_risk::{RiskError, RollingBacktest, RollingForecast, VarForecast};

const NORMAL_99: f64 = 2.326_347_874_040_841;

fn normal_losses(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| StandardNormal.sample(&mut rng)).collect()
}

#[test]
fn test_calibrated_var_passes() {
    let losses = normal_losses(2_500, 17);
    let var = vec![NORMAL_99; losses.len()];
    let result = Backtester::new(0.01).unwrap().backtest(&losses, &var).unwrap();

    assert_eq!(result.kupiec.observations, 2_500);
    assert!((10..=45).contains(&result.kupiec.exceedances));
    assert!(!result.rejects(0.001));
}

#[test]
fn test_understated_var_fails() {
    let losses = normal_losses(2_500, 17);
    // The 90% quantile passed off as the 99% VaR
    let var = vec![1.281_551_565_545; losses.len()];
    let result = Backtester::new(0.01).unwrap().backtest(&losses, &var).unwrap();
    assert!(result.rejects(0.01));
}

fn forecast(var: f64) -> VarForecast {
    VarForecast {
        horizon: 1,
        mean: 0.0,
        volatility: 1.0,
        var,
        es: var + 0.5,
        parametric_var: var,
        parametric_es: var + 0.5,
    }
}

fn rolling(losses: &[f64], targets: &[usize]) -> RollingBacktest {
    RollingBacktest {
        spec: ModelSpec::new(0, 0, 1, 1, DistributionFamily::Normal),
        window: WindowKind::Moving,
        forecasts: targets
            .iter()
            .map(|&t| RollingForecast {
                target: t,
                window_start: 0,
                realized: losses[t],
                forecast: forecast(NORMAL_99),
                refitted: false,
            })
            .collect(),
    }
}

#[test]
fn test_rolling_alignment() {
    let losses = normal_losses(100, 1);
    let backtester = Backtester::new(0.01).unwrap();

    let aligned = rolling(&losses, &(90..100).collect::<Vec<_>>());
    let result = backtester.backtest_rolling(&losses, &aligned).unwrap();
    assert_eq!(result.kupiec.observations, 10);

    let gap = rolling(&losses, &[90, 91, 93]);
    assert!(matches!(
        backtester.backtest_rolling(&losses, &gap),
        Err(RiskError::MisalignedSeries(_))
    ));

    // Forecasts made against a different loss series
    let shifted: Vec<f64> = losses.iter().map(|l| l + 1.0).collect();
    assert!(matches!(
        backtester.backtest_rolling(&shifted, &aligned),
        Err(RiskError::MisalignedSeries(_))
    ));

    // Targets past the end of the series
    assert!(matches!(
        backtester.backtest_rolling(&losses[..95], &aligned),
        Err(RiskError::MisalignedSeries(_))
    ));
}
