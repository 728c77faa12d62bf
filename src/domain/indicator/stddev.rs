//! Rolling sample standard deviation.
//!
//! STD(n)[i] = sqrt(sum((x[i-j] - mean)^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) values are NaN. A window of 1 is always NaN.

use super::full_window;

pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| match full_window(values, i, window) {
            Some(slice) if window > 1 => {
                let mean = slice.iter().sum::<f64>() / window as f64;
                let variance = slice
                    .iter()
                    .map(|v| {
                        let diff = v - mean;
                        diff * diff
                    })
                    .sum::<f64>()
                    / (window - 1) as f64;
                variance.sqrt()
            }
            _ => f64::NAN,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_warmup() {
        let std = rolling_std(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(std[0].is_nan());
        assert!(std[1].is_nan());
        assert!(std[2..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn stddev_constant_values() {
        let std = rolling_std(&[100.0; 5], 3);
        assert!((std[4] - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stddev_known_values() {
        // Sample std of 2,4,4,4,5,5,7,9: variance = 32 / 7
        let std = rolling_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((std[7] - expected).abs() < 1e-12);
    }

    #[test]
    fn stddev_window_one_undefined() {
        assert!(rolling_std(&[1.0, 2.0], 1).iter().all(|v| v.is_nan()));
    }
}
