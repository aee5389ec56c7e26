//! Model selection over a grid of ARMA-GARCH specifications.
//!
//! Every specification in the [`ModelSpace`] is fitted, converged fits are
//! scored by information criteria, and the winner is the smallest AICC with
//! ties broken by SBC, HQC and finally enumeration order. Specifications
//! whose optimizer fails to converge, or that have more parameters than the
//! sample supports, are kept in the report with the failure reason and
//! excluded from the reduction.

use serde::{Deserialize, Serialize};
use tailrisk_core::{DistributionFamily, ModelSpec};
use tailrisk_math::optimization::{NelderMead, Optimizer};
use tracing::{debug, info, warn};

use crate::criteria::InformationCriteria;
use crate::error::{ModelError, ModelResult};
use crate::garch::{FittedModel, GarchEstimator};

/// The grid of candidate specifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpace {
    /// Candidate innovation families, in preference order.
    pub families: Vec<DistributionFamily>,
    /// Largest AR order.
    pub max_p: usize,
    /// Largest MA order.
    pub max_q: usize,
    /// Largest ARCH order.
    pub max_r: usize,
    /// Largest GARCH order.
    pub max_s: usize,
    /// Whether candidates estimate a constant mean.
    pub include_mean: bool,
}

impl Default for ModelSpace {
    fn default() -> Self {
        Self {
            families: DistributionFamily::ALL.to_vec(),
            max_p: 2,
            max_q: 2,
            max_r: 2,
            max_s: 2,
            include_mean: true,
        }
    }
}

impl ModelSpace {
    /// All specifications in canonical order: family (as configured), then
    /// `p`, `q`, `r`, `s` ascending.
    pub fn specs(&self) -> Vec<ModelSpec> {
        let mut specs = Vec::new();
        for &family in &self.families {
            for p in 0..=self.max_p {
                for q in 0..=self.max_q {
                    for r in 0..=self.max_r {
                        for s in 0..=self.max_s {
                            specs.push(
                                ModelSpec::new(p, q, r, s, family).with_mean(self.include_mean),
                            );
                        }
                    }
                }
            }
        }
        specs
    }
}

/// Outcome of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The specification tried.
    pub spec: ModelSpec,
    /// Criteria when the fit converged.
    pub criteria: Option<InformationCriteria>,
    /// Volatility persistence when the fit converged.
    pub persistence: Option<f64>,
    /// Failure reason when it did not.
    pub error: Option<String>,
}

impl Candidate {
    /// Whether the candidate produced a usable fit.
    pub fn converged(&self) -> bool {
        self.criteria.is_some()
    }
}

/// Result of a selection run.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Every candidate in canonical order.
    pub candidates: Vec<Candidate>,
    /// Index of the winner in `candidates`.
    pub selected: usize,
    /// The winning fit.
    pub model: FittedModel,
}

impl Selection {
    /// The winning specification.
    pub fn spec(&self) -> &ModelSpec {
        self.model.spec()
    }

    /// Criteria of the winning fit.
    pub fn criteria(&self) -> Option<&InformationCriteria> {
        self.candidates[self.selected].criteria.as_ref()
    }
}

/// Fits a [`ModelSpace`] and picks the best specification.
#[derive(Debug, Clone)]
pub struct ModelSelector<O = NelderMead> {
    estimator: GarchEstimator<O>,
    require_stationary: bool,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl Default for ModelSelector<NelderMead> {
    fn default() -> Self {
        Self::new(GarchEstimator::new().with_std_errors(false))
    }
}

impl<O: Optimizer> ModelSelector<O> {
    /// Creates a selector around `estimator`.
    pub fn new(estimator: GarchEstimator<O>) -> Self {
        Self {
            estimator,
            require_stationary: false,
            parallel: false,
        }
    }

    /// Excludes non-stationary fits from selection.
    #[must_use]
    pub fn require_stationary(mut self, require: bool) -> Self {
        self.require_stationary = require;
        self
    }

    /// Fits candidates in parallel when built with the `parallel` feature.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The estimator used for each candidate.
    pub fn estimator(&self) -> &GarchEstimator<O> {
        &self.estimator
    }

    /// Fits every specification in `space` to `data` and selects one.
    ///
    /// # Errors
    ///
    /// Non-convergence or insufficient data for individual candidates is
    /// recorded, not returned.
    /// Any other estimation error aborts the run. Fails with
    /// [`ModelError::NoAdmissibleModel`] when nothing is left to choose from.
    pub fn select(&self, space: &ModelSpace, data: &[f64]) -> ModelResult<Selection> {
        let specs = space.specs();
        info!(candidates = specs.len(), observations = data.len(), "model selection");

        let outcomes = self.fit_all(&specs, data);

        let mut candidates = Vec::with_capacity(specs.len());
        let mut fits = Vec::with_capacity(specs.len());
        for (spec, outcome) in specs.iter().zip(outcomes) {
            match outcome {
                Ok(fit) => {
                    let criteria = fit.criteria()?;
                    candidates.push(Candidate {
                        spec: *spec,
                        criteria: Some(criteria),
                        persistence: Some(fit.persistence()),
                        error: None,
                    });
                    fits.push(Some(fit));
                }
                Err(e) if e.is_candidate_failure() => {
                    candidates.push(Candidate {
                        spec: *spec,
                        criteria: None,
                        persistence: None,
                        error: Some(e.to_string()),
                    });
                    fits.push(None);
                }
                Err(e) => return Err(e),
            }
        }

        let selected = best_candidate(&candidates, self.require_stationary).ok_or(
            ModelError::NoAdmissibleModel {
                attempted: specs.len(),
            },
        )?;
        let model = fits
            .swap_remove(selected)
            .ok_or(ModelError::NoAdmissibleModel {
                attempted: specs.len(),
            })?;

        let failed = candidates.iter().filter(|c| !c.converged()).count();
        if failed > 0 {
            warn!(failed, "candidates excluded from selection");
        }
        info!(spec = %model.spec(), "selected model");

        Ok(Selection {
            candidates,
            selected,
            model,
        })
    }

    fn fit_all(&self, specs: &[ModelSpec], data: &[f64]) -> Vec<ModelResult<FittedModel>> {
        let fit_one = |spec: &ModelSpec| {
            let outcome = self.estimator.fit(spec, data);
            debug!(%spec, ok = outcome.is_ok(), "candidate fitted");
            outcome
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            if self.parallel {
                return specs.par_iter().map(fit_one).collect();
            }
        }

        specs.iter().map(fit_one).collect()
    }
}

/// Index of the best converged candidate, ties resolved by position.
pub fn best_candidate(candidates: &[Candidate], require_stationary: bool) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| !require_stationary || c.persistence.is_some_and(|p| p < 1.0))
        .filter_map(|(i, c)| c.criteria.as_ref().map(|ic| (i, ic)))
        .fold(None, |best: Option<(usize, &InformationCriteria)>, (i, ic)| match best {
            Some((_, current)) if ic.selection_order(current).is_ge() => best,
            _ => Some((i, ic)),
        })
        .map(|(i, _)| i)
}
