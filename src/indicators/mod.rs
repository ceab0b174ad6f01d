pub mod delta;

pub use delta::*;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation. 0 for fewer than two values.
pub fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - avg;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.max(0.0).sqrt()
}

/// Z-score of `value` against `(mean, std)`. A degenerate distribution gives 0, never NaN.
pub fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if std <= f64::EPSILON || !std.is_finite() {
        return 0.0;
    }
    let z = (value - mean) / std;
    if z.is_finite() {
        z
    } else {
        0.0
    }
}

/// Least-squares slope of `values` against their index.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Fraction of `history` strictly below `value`, ties counted half. 0.5 for empty history.
pub fn percentile_rank(value: f64, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.5;
    }
    let below = history.iter().filter(|v| **v < value).count() as f64;
    let equal = history.iter().filter(|v| **v == value).count() as f64;
    (below + equal / 2.0) / history.len() as f64
}

/// Percent change from `previous` to `current`; 0 when `previous` is missing or zero.
pub fn pct_change(previous: Option<f64>, current: Option<f64>) -> f64 {
    match (previous, current) {
        (Some(prev), Some(cur)) if prev != 0.0 => (cur - prev) / prev.abs() * 100.0,
        _ => 0.0,
    }
}

/// Day-over-day differences of consecutive present values.
pub fn daily_changes(values: &[Option<f64>]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(cur)) => Some(cur - prev),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_stddev() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
        assert_eq!(stddev(&[5.0]), 0.0);
        assert!((stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_score_degenerate() {
        assert_eq!(z_score(10.0, 10.0, 0.0), 0.0);
        assert_eq!(z_score(12.0, 10.0, 0.0), 0.0);
        assert_eq!(z_score(12.0, 10.0, f64::NAN), 0.0);
        assert_eq!(z_score(12.0, 10.0, 1.0), 2.0);
    }

    #[test]
    fn test_ols_slope() {
        assert_eq!(ols_slope(&[1.0]), 0.0);
        assert!((ols_slope(&[1.0, 2.0, 3.0, 4.0]) - 1.0).abs() < 1e-12);
        assert!((ols_slope(&[10.0, 8.0, 6.0]) + 2.0).abs() < 1e-12);
        assert_eq!(ols_slope(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_percentile_rank() {
        assert_eq!(percentile_rank(5.0, &[]), 0.5);
        assert_eq!(percentile_rank(10.0, &[1.0, 2.0, 3.0, 4.0]), 1.0);
        assert_eq!(percentile_rank(0.0, &[1.0, 2.0, 3.0, 4.0]), 0.0);
        assert_eq!(percentile_rank(2.0, &[1.0, 2.0, 3.0, 4.0]), 0.375);
    }

    #[test]
    fn test_pct_change_and_daily_changes() {
        assert_eq!(pct_change(Some(100.0), Some(103.0)), 3.0);
        assert_eq!(pct_change(None, Some(103.0)), 0.0);
        assert_eq!(pct_change(Some(0.0), Some(1.0)), 0.0);
        assert_eq!(
            daily_changes(&[Some(1.0), Some(3.0), None, Some(4.0), Some(2.0)]),
            vec![2.0, -2.0]
        );
    }
}
