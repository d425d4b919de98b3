//! Percentiles with linear interpolation between closest ranks

/// Percentile `q` (0-100) of `values`, interpolating linearly between ranks
///
/// Equivalent to the common "linear" definition: the value at fractional
/// rank `q / 100 * (n - 1)` of the sorted data. NaN values are ignored.
/// Returns `None` when no finite values remain.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(percentile_of_sorted(&sorted, q))
}

/// Low and high percentiles from one sort
pub fn percentile_pair(values: &[f64], low: f64, high: f64) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some((percentile_of_sorted(&sorted, low), percentile_of_sorted(&sorted, high)))
}

fn percentile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 50.0), Some(2.5));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(4.0));
    }

    #[test]
    fn test_order_does_not_matter() {
        let values: Vec<f64> = (0..=1000).rev().map(|v| v as f64).collect();
        let (low, high) = percentile_pair(&values, 0.5, 99.5).unwrap();
        assert!((low - 5.0).abs() < 1e-9);
        assert!((high - 995.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_nan() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[f64::NAN], 50.0), None);
        assert_eq!(percentile(&[f64::NAN, 7.0], 99.9), Some(7.0));
    }
}
