//! Finite-difference Hessian.

use nalgebra::DMatrix;

/// Central-difference Hessian of `f` at `x`.
///
/// The step for coordinate `i` is `rel_step * max(|x[i]|, 1e-2)`. Entries are
/// left non-finite when `f` is not finite at a probe point; callers decide
/// how to treat such coordinates.
pub fn numerical_hessian<F>(f: F, x: &[f64], rel_step: f64) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x.len();
    let steps: Vec<f64> = x.iter().map(|xi| rel_step * xi.abs().max(1e-2)).collect();
    let f0 = f(x);
    let mut hessian = DMatrix::zeros(n, n);
    let mut probe = x.to_vec();

    let mut eval_at = |shifts: &[(usize, f64)]| {
        for &(i, d) in shifts {
            probe[i] += d;
        }
        let value = f(&probe);
        probe.copy_from_slice(x);
        value
    };

    for i in 0..n {
        let hi = steps[i];
        let up = eval_at(&[(i, hi)]);
        let down = eval_at(&[(i, -hi)]);
        hessian[(i, i)] = (up - 2.0 * f0 + down) / (hi * hi);

        for j in 0..i {
            let hj = steps[j];
            let pp = eval_at(&[(i, hi), (j, hj)]);
            let pm = eval_at(&[(i, hi), (j, -hj)]);
            let mp = eval_at(&[(i, -hi), (j, hj)]);
            let mm = eval_at(&[(i, -hi), (j, -hj)]);
            let value = (pp - pm - mp + mm) / (4.0 * hi * hj);
            hessian[(i, j)] = value;
            hessian[(j, i)] = value;
        }
    }

    hessian
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hessian_of_quadratic_form() {
        // f = x^2 + 3xy + 2y^2  =>  H = [[2, 3], [3, 4]]
        let f = |p: &[f64]| p[0] * p[0] + 3.0 * p[0] * p[1] + 2.0 * p[1] * p[1];
        let h = numerical_hessian(f, &[0.7, -1.3], 1e-4);

        assert_relative_eq!(h[(0, 0)], 2.0, epsilon = 1e-5);
        assert_relative_eq!(h[(0, 1)], 3.0, epsilon = 1e-5);
        assert_relative_eq!(h[(1, 0)], 3.0, epsilon = 1e-5);
        assert_relative_eq!(h[(1, 1)], 4.0, epsilon = 1e-5);
    }
}
