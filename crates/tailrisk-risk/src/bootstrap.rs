//! Filtered historical simulation.
//!
//! Standardized residuals of the fitted model are resampled with
//! replacement and pushed through the ARMA-GARCH recursion, giving an
//! empirical distribution of future losses that keeps the fitted volatility
//! dynamics without assuming an innovation law.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tailrisk_math::stats;
use tailrisk_models::FittedModel;
use tracing::debug;

use crate::error::{RiskError, RiskResult};
use crate::forecast::{check_stationary, RecursionState};

/// Default number of simulated paths.
pub const DEFAULT_SIMULATIONS: usize = 10_000;

/// Default seed.
pub const DEFAULT_SEED: u64 = 42;

/// Empirical risk measures for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapStep {
    /// Steps ahead, starting at 1.
    pub horizon: usize,
    /// Mean simulated loss.
    pub mean: f64,
    /// Empirical `1 - alpha` quantile of simulated losses.
    pub var: f64,
    /// Mean of simulated losses at or above `var`.
    pub es: f64,
}

/// Result of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapForecast {
    /// Paths simulated.
    pub simulations: usize,
    /// Seed used.
    pub seed: u64,
    /// Significance level `alpha`.
    pub significance: f64,
    /// One entry per step.
    pub steps: Vec<BootstrapStep>,
}

/// Seeded filtered historical simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredHistoricalSimulation {
    simulations: usize,
    seed: u64,
    significance: f64,
    horizon: usize,
}

impl FilteredHistoricalSimulation {
    /// Creates a simulator.
    pub fn new(simulations: usize, seed: u64, significance: f64, horizon: usize) -> RiskResult<Self> {
        if simulations == 0 || horizon == 0 {
            return Err(RiskError::invalid_input(
                "simulations and horizon must be at least 1",
            ));
        }
        if !(significance > 0.0 && significance < 1.0) {
            return Err(RiskError::invalid_input(format!(
                "significance must lie in (0, 1), got {significance}"
            )));
        }
        Ok(Self {
            simulations,
            seed,
            significance,
            horizon,
        })
    }

    /// Simulates `horizon` steps ahead of the end of `model`'s sample.
    ///
    /// # Errors
    ///
    /// Fails for non-stationary models and when the model has no finite
    /// standardized residuals to draw from.
    pub fn simulate(&self, model: &FittedModel) -> RiskResult<BootstrapForecast> {
        check_stationary(model)?;
        let pool: Vec<f64> = model
            .standardized_residuals()
            .iter()
            .copied()
            .filter(|z| z.is_finite())
            .collect();
        if pool.is_empty() {
            return Err(RiskError::invalid_input("no residuals to resample"));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let origin = RecursionState::from_model(model);
        let mut losses = vec![Vec::with_capacity(self.simulations); self.horizon];

        for _ in 0..self.simulations {
            let mut state = origin.clone();
            for step in losses.iter_mut() {
                let mean = state.next_mean();
                let variance = state.next_variance();
                let shock = variance.sqrt() * pool[rng.gen_range(0..pool.len())];
                let loss = mean + shock;
                state.push(loss, shock, shock * shock, variance);
                step.push(loss);
            }
        }

        let level = 1.0 - self.significance;
        let steps = losses
            .iter_mut()
            .enumerate()
            .map(|(i, sample)| {
                sample.sort_by(f64::total_cmp);
                let var = stats::quantile_sorted(sample, level);
                let tail: Vec<f64> = sample.iter().copied().filter(|&l| l >= var).collect();
                BootstrapStep {
                    horizon: i + 1,
                    mean: stats::mean(sample),
                    var,
                    es: stats::mean(&tail),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            simulations = self.simulations,
            seed = self.seed,
            var = steps[0].var,
            "bootstrap forecast"
        );
        Ok(BootstrapForecast {
            simulations: self.simulations,
            seed: self.seed,
            significance: self.significance,
            steps,
        })
    }
}
