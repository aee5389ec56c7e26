//! Bounded Nelder-Mead simplex search.

use tracing::trace;

use super::{check_dimensions, sanitize, Bounds, OptimizationConfig, OptimizationResult, Optimizer};
use crate::error::{MathError, MathResult};

/// Derivative-free simplex minimizer with projection onto box bounds.
///
/// Every trial point (reflection, expansion, contraction, shrink) is clamped
/// into the bounds before evaluation. After convergence the search is
/// restarted `restarts` times from the best vertex with a fresh simplex,
/// which guards against the premature collapse the method is known for.
///
/// # Example
///
/// ```rust
/// use tailrisk_math::optimization::{Bounds, NelderMead, OptimizationConfig, Optimizer};
///
/// // Minimize (x - 2)^2 + (y + 1)^2 with x restricted to [0, 1]
/// let f = |p: &[f64]| (p[0] - 2.0).powi(2) + (p[1] + 1.0).powi(2);
/// let bounds = Bounds::new(vec![0.0, -10.0], vec![1.0, 10.0]).unwrap();
///
/// let result = NelderMead::default()
///     .minimize(f, &[0.5, 0.0], &bounds, &OptimizationConfig::default())
///     .unwrap();
/// assert!((result.parameters[0] - 1.0).abs() < 1e-6);
/// assert!((result.parameters[1] + 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMead {
    /// Reflection coefficient.
    pub reflection: f64,
    /// Expansion coefficient.
    pub expansion: f64,
    /// Contraction coefficient.
    pub contraction: f64,
    /// Shrink coefficient.
    pub shrink: f64,
    /// Relative size of the initial simplex.
    pub initial_scale: f64,
    /// Number of restarts after a converged run.
    pub restarts: u32,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_scale: 0.05,
            restarts: 1,
        }
    }
}

impl NelderMead {
    /// Sets the number of restarts.
    #[must_use]
    pub fn with_restarts(mut self, restarts: u32) -> Self {
        self.restarts = restarts;
        self
    }

    fn initial_simplex(&self, x0: &[f64], bounds: &Bounds) -> Vec<Vec<f64>> {
        let mut simplex = Vec::with_capacity(x0.len() + 1);
        simplex.push(x0.to_vec());
        for i in 0..x0.len() {
            let mut vertex = x0.to_vec();
            let delta = if x0[i] == 0.0 {
                0.00025
            } else {
                self.initial_scale * x0[i].abs()
            };
            vertex[i] = if x0[i] + delta <= bounds.upper()[i] {
                x0[i] + delta
            } else {
                x0[i] - delta
            };
            bounds.project(&mut vertex);
            simplex.push(vertex);
        }
        simplex
    }

    fn run<F>(
        &self,
        f: &F,
        x0: &[f64],
        bounds: &Bounds,
        config: &OptimizationConfig,
        budget: u32,
    ) -> OptimizationResult
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = x0.len();
        let eval = |x: &[f64]| sanitize(f(x));
        let mut vertices: Vec<(Vec<f64>, f64)> = self
            .initial_simplex(x0, bounds)
            .into_iter()
            .map(|v| {
                let fv = eval(&v);
                (v, fv)
            })
            .collect();

        let trial = |from: &[f64], toward: &[f64], coef: f64| -> Vec<f64> {
            let mut x: Vec<f64> = from
                .iter()
                .zip(toward)
                .map(|(c, t)| c + coef * (t - c))
                .collect();
            bounds.project(&mut x);
            x
        };

        for iteration in 0..budget {
            vertices.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best_value = vertices[0].1;
            let worst_value = vertices[n].1;
            let value_spread = worst_value - best_value;
            let param_spread = vertices[1..]
                .iter()
                .flat_map(|(v, _)| v.iter().zip(&vertices[0].0).map(|(a, b)| (a - b).abs()))
                .fold(0.0_f64, f64::max);

            if value_spread <= config.tolerance * (1.0 + best_value.abs())
                && param_spread <= config.parameter_tolerance
            {
                trace!(iteration, best_value, "simplex converged");
                return OptimizationResult {
                    parameters: vertices.swap_remove(0).0,
                    objective_value: best_value,
                    iterations: iteration,
                    converged: true,
                };
            }

            let mut centroid = vec![0.0; n];
            for (v, _) in &vertices[..n] {
                for (c, x) in centroid.iter_mut().zip(v) {
                    *c += x / n as f64;
                }
            }

            let worst = vertices[n].0.clone();
            let reflected = trial(&centroid, &worst, -self.reflection);
            let f_reflected = eval(&reflected);

            if f_reflected < best_value {
                let expanded = trial(&centroid, &reflected, self.expansion);
                let f_expanded = eval(&expanded);
                vertices[n] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
                continue;
            }

            if f_reflected < vertices[n - 1].1 {
                vertices[n] = (reflected, f_reflected);
                continue;
            }

            let (contracted, f_contracted, accept) = if f_reflected < worst_value {
                let c = trial(&centroid, &reflected, self.contraction);
                let fc = eval(&c);
                let ok = fc <= f_reflected;
                (c, fc, ok)
            } else {
                let c = trial(&centroid, &worst, self.contraction);
                let fc = eval(&c);
                let ok = fc < worst_value;
                (c, fc, ok)
            };

            if accept {
                vertices[n] = (contracted, f_contracted);
                continue;
            }

            let anchor = vertices[0].0.clone();
            for (v, fv) in vertices.iter_mut().skip(1) {
                let shrunk = trial(&anchor, v.as_slice(), self.shrink);
                *fv = eval(&shrunk);
                *v = shrunk;
            }
        }

        vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (parameters, objective_value) = vertices.swap_remove(0);
        OptimizationResult {
            parameters,
            objective_value,
            iterations: budget,
            converged: false,
        }
    }
}

impl Optimizer for NelderMead {
    fn minimize<F>(
        &self,
        f: F,
        initial: &[f64],
        bounds: &Bounds,
        config: &OptimizationConfig,
    ) -> MathResult<OptimizationResult>
    where
        F: Fn(&[f64]) -> f64,
    {
        check_dimensions(initial, bounds)?;

        let mut x0 = initial.to_vec();
        bounds.project(&mut x0);
        if !sanitize(f(&x0)).is_finite() {
            return Err(MathError::NonFiniteObjective);
        }

        let mut result = self.run(&f, &x0, bounds, config, config.max_iterations);
        let mut used = result.iterations;

        for _ in 0..self.restarts {
            if !result.converged || used >= config.max_iterations {
                break;
            }
            let restart = self.run(&f, &result.parameters, bounds, config, config.max_iterations - used);
            used += restart.iterations;
            // A restart that does not improve leaves the converged run intact
            if restart.objective_value < result.objective_value {
                result = restart;
            } else {
                break;
            }
        }

        result.iterations = used;
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Nelder-Mead"
    }
}
