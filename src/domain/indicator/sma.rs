//! Simple moving average.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) values are NaN.

use super::full_window;

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| match full_window(values, i, window) {
            Some(slice) => slice.iter().sum::<f64>() / window as f64,
            None => f64::NAN,
        })
        .collect()
}
