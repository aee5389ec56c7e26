//! Sample statistics on `f64` slices.

use crate::error::{MathError, MathResult};

/// Arithmetic mean. Returns `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (divisor `n - 1`).
pub fn variance(values: &[f64]) -> MathResult<f64> {
    if values.len() < 2 {
        return Err(MathError::insufficient_data(2, values.len()));
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> MathResult<f64> {
    variance(values).map(f64::sqrt)
}

/// Moment-based skewness `m3 / m2^1.5`.
pub fn skewness(values: &[f64]) -> MathResult<f64> {
    let (m2, m3, _) = central_moments(values)?;
    Ok(m3 / m2.powf(1.5))
}

/// Moment-based excess kurtosis `m4 / m2^2 - 3`.
pub fn excess_kurtosis(values: &[f64]) -> MathResult<f64> {
    let (m2, _, m4) = central_moments(values)?;
    Ok(m4 / (m2 * m2) - 3.0)
}

fn central_moments(values: &[f64]) -> MathResult<(f64, f64, f64)> {
    if values.len() < 3 {
        return Err(MathError::insufficient_data(3, values.len()));
    }
    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    if m2 <= 0.0 {
        return Err(MathError::invalid_input("series has zero variance"));
    }
    Ok((m2 / n, m3 / n, m4 / n))
}

/// Empirical quantile with linear interpolation between order statistics
/// (Hyndman-Fan type 7, the default of most statistics packages).
pub fn quantile(values: &[f64], p: f64) -> MathResult<f64> {
    if values.is_empty() {
        return Err(MathError::insufficient_data(1, 0));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(MathError::invalid_input(format!(
            "quantile level {p} outside [0, 1]"
        )));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(quantile_sorted(&sorted, p))
}

/// Type-7 quantile of an already sorted slice.
///
/// # Panics
///
/// Panics if `sorted` is empty or `p` lies outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Sample autocorrelations at lags `1..=max_lag`.
pub fn autocorrelation(series: &[f64], max_lag: usize) -> MathResult<Vec<f64>> {
    if series.len() <= max_lag {
        return Err(MathError::insufficient_data(max_lag + 1, series.len()));
    }
    let m = mean(series);
    let denom: f64 = series.iter().map(|v| (v - m).powi(2)).sum();
    if denom <= 0.0 {
        return Err(MathError::invalid_input("series has zero variance"));
    }
    Ok((1..=max_lag)
        .map(|lag| {
            series[lag..]
                .iter()
                .zip(series)
                .map(|(a, b)| (a - m) * (b - m))
                .sum::<f64>()
                / denom
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    #[should_panic]
    fn test_quantile_sorted_empty_panics() {
        let _ = quantile_sorted(&[], 0.5);
    }

    #[test]
    fn test_moments() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&data), 5.0);
        assert_relative_eq!(variance(&data).unwrap(), 32.0 / 7.0, epsilon = 1e-12);
        assert!(variance(&[1.0]).is_err());
    }

    #[test]
    fn test_symmetric_sample_has_zero_skew() {
        let data = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert_relative_eq!(skewness(&data).unwrap(), 0.0, epsilon = 1e-12);
        // Uniform-like sample is platykurtic
        assert!(excess_kurtosis(&data).unwrap() < 0.0);
    }

    #[test]
    fn test_quantile_type7() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile(&data, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&data, 0.5).unwrap(), 3.0);
        assert_relative_eq!(quantile(&data, 0.9).unwrap(), 4.6, epsilon = 1e-12);
        assert_relative_eq!(quantile(&data, 1.0).unwrap(), 5.0);
        assert!(quantile(&data, 1.5).is_err());
    }

    #[test]
    fn test_autocorrelation_alternating() {
        let series: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let acf = autocorrelation(&series, 2).unwrap();
        assert!(acf[0] < -0.95);
        assert!(acf[1] > 0.95);
    }

    proptest! {
        #[test]
        fn quantile_is_within_sample_range(
            data in prop::collection::vec(-1e6f64..1e6, 1..200),
            p in 0.0f64..=1.0,
        ) {
            let q = quantile(&data, p).unwrap();
            let min = data.iter().copied().fold(f64::INFINITY, f64::min);
            let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(q >= min - 1e-6 && q <= max + 1e-6);
        }
    }
}
