//! Windowed series transforms over `f64` columns.
//!
//! Every function returns a series the same length as its input. Rows whose
//! window is not yet full, or whose window contains a `NaN`, are `NaN`.
//! Callers treat `NaN` as "undefined" rather than as an error.

pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use roc::pct_change;
pub use rsi::rolling_rsi;
pub use sma::rolling_mean;
pub use stddev::rolling_std;

/// `window` consecutive values ending at `i`, or `None` during warm-up or
/// when any value in the window is `NaN`.
pub(crate) fn full_window(values: &[f64], i: usize, window: usize) -> Option<&[f64]> {
    if window == 0 || i + 1 < window {
        return None;
    }
    let slice = &values[i + 1 - window..=i];
    if slice.iter().any(|v| v.is_nan()) {
        None
    } else {
        Some(slice)
    }
}
