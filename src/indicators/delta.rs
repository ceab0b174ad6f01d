/// Default delta horizon in sequence positions (one row per calendar day).
pub const DELTA_HORIZON: usize = 28;

/// `values[i] - values[i - horizon]`, by position. `None` when either end is absent
/// or `i - horizon` is out of range; a missing signal is never reported as 0.
pub fn delta_at(values: &[Option<f64>], i: usize, horizon: usize) -> Option<f64> {
    if horizon == 0 || i < horizon || i >= values.len() {
        return None;
    }
    match (values[i], values[i - horizon]) {
        (Some(current), Some(past)) => Some(current - past),
        _ => None,
    }
}

/// Deltas for a whole sequence; the result has the same length as `values`.
/// The output stays in the unit of the input series.
pub fn deltas(values: &[Option<f64>], horizon: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| delta_at(values, i, horizon))
        .collect()
}
