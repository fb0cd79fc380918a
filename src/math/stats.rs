//! Missing-aware statistical primitives.
//!
//! Missing values are `None`; they never contribute to a sum or a count.

pub fn nan_mean(values: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.iter().flatten() {
        sum += *v;
        n += 1;
    }
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Sum of the present values; an all-missing slice sums to zero.
pub fn nan_sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Population variance over present values.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
