//! ARMA-GARCH parameter vector.

use serde::{Deserialize, Serialize};
use tailrisk_core::{DistributionFamily, ModelSpec};
use tailrisk_math::optimization::Bounds;

use crate::distributions::{
    Innovation, GED_SHAPE_MAX, GED_SHAPE_MIN, SKEW_MAX, SKEW_MIN, STUDENT_T_SHAPE_MAX,
    STUDENT_T_SHAPE_MIN,
};
use crate::error::{ModelError, ModelResult};

const ARMA_LIMIT: f64 = 0.999;
const OMEGA_FLOOR: f64 = 1e-6;
const OMEGA_CAP: f64 = 10.0;
const MEAN_BAND: f64 = 10.0;

/// Parameters of an ARMA(p,q)-GARCH(r,s) model.
///
/// The flat vector layout used by the optimizer is
/// `[mu?, ar.., ma.., omega, alpha.., beta.., shape?, skew?]`, where `mu`
/// is present only when the specification estimates a mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarchParameters {
    /// Unconditional mean (zero when not estimated).
    pub mu: f64,
    /// Autoregressive coefficients `phi_1..phi_p`.
    pub ar: Vec<f64>,
    /// Moving-average coefficients `theta_1..theta_q`.
    pub ma: Vec<f64>,
    /// Variance intercept `alpha_0`.
    pub omega: f64,
    /// ARCH coefficients `alpha_1..alpha_r`.
    pub alpha: Vec<f64>,
    /// GARCH coefficients `beta_1..beta_s`.
    pub beta: Vec<f64>,
    /// Distribution shape, if the family has one.
    pub shape: Option<f64>,
    /// Distribution skew, if the family has one.
    pub skew: Option<f64>,
}

impl GarchParameters {
    /// Decodes a flat vector laid out for `spec`.
    pub fn from_vector(spec: &ModelSpec, x: &[f64]) -> ModelResult<Self> {
        if x.len() != spec.num_params() {
            return Err(ModelError::invalid_input(format!(
                "{spec} has {} parameters, got {}",
                spec.num_params(),
                x.len()
            )));
        }

        let mut it = x.iter().copied();
        let mut take = |n: usize| it.by_ref().take(n).collect::<Vec<f64>>();

        let mu = if spec.include_mean { take(1)[0] } else { 0.0 };
        let ar = take(spec.arma_p);
        let ma = take(spec.arma_q);
        let omega = take(1)[0];
        let alpha = take(spec.garch_r);
        let beta = take(spec.garch_s);
        let shape = spec.family.has_shape().then(|| take(1)[0]);
        let skew = spec.family.has_skew().then(|| take(1)[0]);

        Ok(Self {
            mu,
            ar,
            ma,
            omega,
            alpha,
            beta,
            shape,
            skew,
        })
    }

    /// Encodes the parameters as a flat vector.
    pub fn to_vector(&self, spec: &ModelSpec) -> Vec<f64> {
        let mut x = Vec::with_capacity(spec.num_params());
        if spec.include_mean {
            x.push(self.mu);
        }
        x.extend(&self.ar);
        x.extend(&self.ma);
        x.push(self.omega);
        x.extend(&self.alpha);
        x.extend(&self.beta);
        x.extend(self.shape);
        x.extend(self.skew);
        x
    }

    /// Parameter names in vector order.
    pub fn names(spec: &ModelSpec) -> Vec<String> {
        let mut names = Vec::with_capacity(spec.num_params());
        if spec.include_mean {
            names.push("mu".to_string());
        }
        names.extend((1..=spec.arma_p).map(|i| format!("ar{i}")));
        names.extend((1..=spec.arma_q).map(|i| format!("ma{i}")));
        names.push("omega".to_string());
        names.extend((1..=spec.garch_r).map(|i| format!("alpha{i}")));
        names.extend((1..=spec.garch_s).map(|i| format!("beta{i}")));
        if spec.family.has_shape() {
            names.push("shape".to_string());
        }
        if spec.family.has_skew() {
            names.push("skew".to_string());
        }
        names
    }

    /// Checks that the parameter counts agree with `spec`.
    pub fn check_matches(&self, spec: &ModelSpec) -> ModelResult<()> {
        let consistent = self.ar.len() == spec.arma_p
            && self.ma.len() == spec.arma_q
            && self.alpha.len() == spec.garch_r
            && self.beta.len() == spec.garch_s
            && self.shape.is_some() == spec.family.has_shape()
            && self.skew.is_some() == spec.family.has_skew()
            && (spec.include_mean || self.mu == 0.0);
        if consistent {
            Ok(())
        } else {
            Err(ModelError::invalid_input(format!(
                "parameters do not match {spec}"
            )))
        }
    }

    /// Volatility persistence `sum(alpha) + sum(beta)`.
    pub fn persistence(&self) -> f64 {
        self.alpha.iter().sum::<f64>() + self.beta.iter().sum::<f64>()
    }

    /// Whether `sum(alpha) + sum(beta) < 1`.
    pub fn is_stationary(&self) -> bool {
        self.persistence() < 1.0
    }

    /// Long-run variance `omega / (1 - persistence)`, if stationary.
    pub fn unconditional_variance(&self) -> Option<f64> {
        self.is_stationary()
            .then(|| self.omega / (1.0 - self.persistence()))
    }

    /// The innovation distribution these parameters describe.
    pub fn innovation(&self, family: DistributionFamily) -> ModelResult<Innovation> {
        Innovation::new(family, self.shape, self.skew)
    }

    /// Starting point for estimation on a series with the given moments.
    pub(crate) fn initial(spec: &ModelSpec, mean: f64, variance: f64) -> Self {
        let alpha = vec![0.1 / spec.garch_r.max(1) as f64; spec.garch_r];
        let beta = vec![0.8 / spec.garch_s.max(1) as f64; spec.garch_s];
        let persistence: f64 = alpha.iter().chain(&beta).sum();
        let shape = match spec.family {
            DistributionFamily::StudentT | DistributionFamily::SkewStudentT => Some(8.0),
            DistributionFamily::Ged | DistributionFamily::SkewGed => Some(1.5),
            _ => None,
        };

        Self {
            mu: if spec.include_mean { mean } else { 0.0 },
            ar: vec![0.0; spec.arma_p],
            ma: vec![0.0; spec.arma_q],
            omega: variance * (1.0 - persistence),
            alpha,
            beta,
            shape,
            skew: spec.family.has_skew().then_some(1.0),
        }
    }

    /// Box constraints for the optimizer.
    pub(crate) fn bounds(spec: &ModelSpec, mean: f64, variance: f64) -> ModelResult<Bounds> {
        let sd = variance.sqrt();
        let mut lower = Vec::with_capacity(spec.num_params());
        let mut upper = Vec::with_capacity(spec.num_params());
        let mut push = |lo: f64, hi: f64, n: usize| {
            lower.extend(std::iter::repeat(lo).take(n));
            upper.extend(std::iter::repeat(hi).take(n));
        };

        if spec.include_mean {
            push(mean - MEAN_BAND * sd, mean + MEAN_BAND * sd, 1);
        }
        push(-ARMA_LIMIT, ARMA_LIMIT, spec.arma_p + spec.arma_q);
        push(OMEGA_FLOOR * variance, OMEGA_CAP * variance, 1);
        push(0.0, 1.0, spec.garch_r + spec.garch_s);
        match spec.family {
            DistributionFamily::StudentT | DistributionFamily::SkewStudentT => {
                push(STUDENT_T_SHAPE_MIN, STUDENT_T_SHAPE_MAX, 1);
            }
            DistributionFamily::Ged | DistributionFamily::SkewGed => {
                push(GED_SHAPE_MIN, GED_SHAPE_MAX, 1);
            }
            _ => {}
        }
        if spec.family.has_skew() {
            push(SKEW_MIN, SKEW_MAX, 1);
        }

        Ok(Bounds::new(lower, upper)?)
    }
}
