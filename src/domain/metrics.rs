//! Performance summary of a portfolio value series.
//!
//! The formulas are deliberately simple and must stay bit-for-bit stable:
//! returns are first differences of value (not log or percentage returns),
//! drawdown is whole-series min/max (not a running peak), and annualisation
//! divides rather than compounds.

use serde::Serialize;

use super::backtest::DailySnapshot;
use super::logging::Logger;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub trading_days: usize,
    pub total_trades: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceAnalyzer {
    logger: Logger,
}

impl PerformanceAnalyzer {
    pub fn new(logger: Logger) -> Self {
        PerformanceAnalyzer { logger }
    }

    pub fn analyze(&self, snapshots: &[DailySnapshot]) -> PerformanceMetrics {
        let values: Vec<f64> = snapshots.iter().map(|s| s.portfolio_value).collect();
        let total_trades = snapshots.iter().map(|s| s.trades.len()).sum();
        let metrics = PerformanceMetrics {
            total_trades,
            ..analyze_values(&values)
        };
        self.logger.info(format_args!(
            "total return {:.4}, annual {:.4}, max drawdown {:.4}, sharpe {:.4} over {} days",
            metrics.total_return,
            metrics.annual_return,
            metrics.max_drawdown,
            metrics.sharpe_ratio,
            metrics.trading_days
        ));
        metrics
    }
}

/// Reduce V0..Vn-1 to summary statistics. `total_trades` is left at 0.
pub fn analyze_values(values: &[f64]) -> PerformanceMetrics {
    let n = values.len();
    if n == 0 {
        return PerformanceMetrics::default();
    }

    let first = values[0];
    let last = values[n - 1];

    let total_return = if first != 0.0 {
        (last - first) / first
    } else {
        0.0
    };

    let years = n as f64 / TRADING_DAYS_PER_YEAR;
    let annual_return = total_return / years;

    PerformanceMetrics {
        total_return,
        annual_return,
        max_drawdown: compute_drawdown(values),
        sharpe_ratio: compute_sharpe(values),
        trading_days: n,
        total_trades: 0,
    }
}

/// min(V) / max(V) - 1
fn compute_drawdown(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if max <= 0.0 || !max.is_finite() {
        return 0.0;
    }
    min / max - 1.0
}

/// mean(dV) / std(dV) * sqrt(252), sample standard deviation.
fn compute_sharpe(values: &[f64]) -> f64 {
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.len() < 2 {
        return 0.0;
    }

    let count = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / count;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (count - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
