//! Percentage change over `period` rows.
//!
//! PCT(n)[i] = C[i] / C[i-n] - 1
//! Warmup: first n values are NaN. A zero base yields an IEEE infinity
//! (or NaN for 0/0), not an error.

pub fn pct_change(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i < period {
                f64::NAN
            } else {
                values[i] / values[i - period] - 1.0
            }
        })
        .collect()
}
