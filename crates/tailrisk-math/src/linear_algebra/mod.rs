//! Linear algebra utilities.
//!
//! Thin wrappers over `nalgebra` for the regressions and covariance
//! inversions the estimators need.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Ordinary least squares fit `y ~ X b`.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    /// Estimated coefficients.
    pub coefficients: DVector<f64>,
    /// Fitted values `X b`.
    pub fitted: DVector<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Coefficient of determination (centered).
    pub r_squared: f64,
}

/// Solves the least squares problem through the normal equations.
///
/// `x` must have at least as many rows as columns and full column rank.
pub fn least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> MathResult<LeastSquaresFit> {
    if x.nrows() != y.len() {
        return Err(MathError::DimensionMismatch {
            rows1: x.nrows(),
            cols1: x.ncols(),
            rows2: y.len(),
            cols2: 1,
        });
    }
    if x.nrows() < x.ncols() {
        return Err(MathError::insufficient_data(x.ncols(), x.nrows()));
    }

    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let coefficients = solve_linear_system(&xtx, &xty)?;

    let fitted = x * &coefficients;
    let rss: f64 = (y - &fitted).iter().map(|r| r * r).sum();
    let mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    Ok(LeastSquaresFit {
        coefficients,
        fitted,
        rss,
        r_squared,
    })
}

/// Solves a square linear system `A x = b` by LU decomposition.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if n != b.len() {
        return Err(MathError::DimensionMismatch {
            rows1: n,
            cols1: n,
            rows2: b.len(),
            cols2: 1,
        });
    }

    a.clone().lu().solve(b).ok_or(MathError::SingularMatrix)
}

/// Inverts a square matrix, failing on singular or non-finite input.
pub fn invert(matrix: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    if matrix.nrows() != matrix.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("Matrix has non-finite entries"));
    }
    matrix
        .clone()
        .try_inverse()
        .filter(|inv| inv.iter().all(|v| v.is_finite()))
        .ok_or(MathError::SingularMatrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_least_squares_exact_line() {
        // y = 1 + 2x
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);
        let fit = least_squares(&x, &y).unwrap();

        assert_relative_eq!(fit.coefficients[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
        assert!(fit.rss < 1e-20);
    }

    #[test]
    fn test_least_squares_shape_errors() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            least_squares(&x, &y),
            Err(MathError::InsufficientData { .. })
        ));

        let y = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            least_squares(&x, &y),
            Err(MathError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_invert() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv = invert(&m).unwrap();
        let identity = &m * &inv;
        assert_relative_eq!(identity[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(identity[(0, 1)], 0.0, epsilon = 1e-12);

        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(invert(&singular).unwrap_err(), MathError::SingularMatrix);
    }
}
