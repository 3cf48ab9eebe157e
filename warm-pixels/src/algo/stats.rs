//! Summary statistics over slices of f64.
//!
//! NaN values are ignored by every function here. All functions return
//! `None` when no finite-or-infinite samples remain.

fn valid_values(values: &[f64]) -> Vec<f64> {
    values.iter().filter(|v| !v.is_nan()).copied().collect()
}

/// Arithmetic mean of the non-NaN values.
pub fn mean(values: &[f64]) -> Option<f64> {
    let valid = valid_values(values);
    if valid.is_empty() {
        return None;
    }
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
}

/// Calculate median of a slice of f64 values
///
/// NaN values are filtered out but infinite values (±inf) are kept. For
/// even-length data, returns the average of the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut valid = valid_values(values);
    if valid.is_empty() {
        return None;
    }

    valid.sort_by(|a, b| a.total_cmp(b));

    let mid = valid.len() / 2;
    let median_value = if valid.len() % 2 == 0 {
        (valid[mid - 1] + valid[mid]) / 2.0
    } else {
        valid[mid]
    };

    Some(median_value)
}

/// Population standard deviation (divides by N, not N-1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let valid = valid_values(values);
    let mu = mean(&valid)?;
    let variance = valid.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / valid.len() as f64;
    Some(variance.sqrt())
}
