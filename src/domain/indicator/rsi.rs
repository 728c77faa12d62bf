//! RSI (Relative Strength Index) from simple rolling means.
//!
//! - change[0] counts as no move (gain 0, loss 0); change[i] = C[i] - C[i-1]
//! - avg_gain, avg_loss: simple mean over the last n changes
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! avg_loss == 0 with avg_gain > 0 gives RSI = 100; both zero is undefined.
//!
//! Warmup: first (n-1) values are NaN.

use super::sma::rolling_mean;

pub fn rolling_rsi(closes: &[f64], window: usize) -> Vec<f64> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        if change.is_nan() {
            gains.push(f64::NAN);
            losses.push(f64::NAN);
        } else {
            gains.push(if change > 0.0 { change } else { 0.0 });
            losses.push(if change < 0.0 { -change } else { 0.0 });
        }
    }

    let avg_gain = rolling_mean(&gains, window);
    let avg_loss = rolling_mean(&losses, window);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&gain, &loss)| 100.0 - (100.0 / (1.0 + gain / loss)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_warmup() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 5) as f64).collect();
        let rsi = rolling_rsi(&closes, 14);
        for (i, value) in rsi.iter().enumerate().take(13) {
            assert!(value.is_nan(), "row {} should be undefined", i);
        }
        assert!(rsi[13].is_finite());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rsi = rolling_rsi(&closes, 5);
        assert!((rsi[9] - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let rsi = rolling_rsi(&closes, 5);
        assert!(rsi[9].abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_prices_undefined() {
        let rsi = rolling_rsi(&[50.0; 8], 3);
        assert!(rsi.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_known_value() {
        // changes over last 3: +2, -1, +1 -> gain 1.0, loss 1/3, rs 3
        let rsi = rolling_rsi(&[10.0, 12.0, 11.0, 12.0], 3);
        assert!((rsi[3] - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=30)
            .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0)
            .collect();
        for value in rolling_rsi(&closes, 14).iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(value), "RSI {} out of range", value);
        }
    }
}
