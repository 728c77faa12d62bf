//! Signal-generating strategies.
//!
//! A [`Strategy`] is a pure function of the history table: it must not look
//! beyond the current row's rolling window, and undefined window values
//! become [`SignalDirection::Hold`] rather than errors. Windows are computed
//! per symbol.

use crate::domain::error::QuantError;
use crate::domain::history::HistoryTable;
use crate::domain::indicator::{rolling_mean, rolling_rsi};
use crate::domain::indicator_helpers::{closes, per_symbol};
use crate::domain::signal::{SignalDirection, SignalTable};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Parameters a strategy ran with, for reproducibility.
pub type StrategyParameters = BTreeMap<String, f64>;

pub trait Strategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn generate_signals(&self, history: &HistoryTable) -> SignalTable;

    fn parameters(&self) -> StrategyParameters;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageCross {
    pub short_window: usize,
    pub long_window: usize,
}

impl MovingAverageCross {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window,
            long_window,
        }
    }
}

impl Default for MovingAverageCross {
    fn default() -> Self {
        Self::new(20, 50)
    }
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        "moving_average_cross"
    }

    fn generate_signals(&self, history: &HistoryTable) -> SignalTable {
        let close = closes(history);
        let sma_short = per_symbol(history, &close, |s| rolling_mean(s, self.short_window));
        let sma_long = per_symbol(history, &close, |s| rolling_mean(s, self.long_window));

        let directions = sma_short
            .iter()
            .zip(&sma_long)
            .map(|(&short, &long)| SignalDirection::from_comparison(short, long))
            .collect();

        SignalTable::from_history(history, directions)
            .with_column("sma_short", sma_short)
            .with_column("sma_long", sma_long)
    }

    fn parameters(&self) -> StrategyParameters {
        BTreeMap::from([
            ("short_window".to_string(), self.short_window as f64),
            ("long_window".to_string(), self.long_window as f64),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiThreshold {
    pub window: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiThreshold {
    pub fn new(window: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            window,
            oversold,
            overbought,
        }
    }
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self::new(14, 30.0, 70.0)
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn generate_signals(&self, history: &HistoryTable) -> SignalTable {
        let close = closes(history);
        let rsi = per_symbol(history, &close, |s| rolling_rsi(s, self.window));

        let directions = rsi
            .iter()
            .map(|&value| {
                if value < self.oversold {
                    SignalDirection::Buy
                } else if value > self.overbought {
                    SignalDirection::Sell
                } else {
                    SignalDirection::Hold
                }
            })
            .collect();

        SignalTable::from_history(history, directions).with_column("rsi", rsi)
    }

    fn parameters(&self) -> StrategyParameters {
        BTreeMap::from([
            ("window".to_string(), self.window as f64),
            ("oversold".to_string(), self.oversold),
            ("overbought".to_string(), self.overbought),
        ])
    }
}

/// Configured strategy description, as read from the `[strategy]` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    MovingAverageCross {
        short_window: usize,
        long_window: usize,
    },
    RsiThreshold {
        window: usize,
        oversold: f64,
        overbought: f64,
    },
}

impl StrategySpec {
    pub fn validate(&self) -> Result<(), QuantError> {
        match *self {
            StrategySpec::MovingAverageCross {
                short_window,
                long_window,
            } => {
                if short_window == 0 {
                    return Err(invalid("short_window", "must be positive"));
                }
                if long_window <= short_window {
                    return Err(invalid(
                        "long_window",
                        "must be greater than short_window",
                    ));
                }
            }
            StrategySpec::RsiThreshold {
                window,
                oversold,
                overbought,
            } => {
                if window == 0 {
                    return Err(invalid("window", "must be positive"));
                }
                if !(0.0..=100.0).contains(&oversold) {
                    return Err(invalid("oversold", "must be within [0, 100]"));
                }
                if !(0.0..=100.0).contains(&overbought) || overbought <= oversold {
                    return Err(invalid(
                        "overbought",
                        "must be within [0, 100] and greater than oversold",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategySpec::MovingAverageCross {
                short_window,
                long_window,
            } => Box::new(MovingAverageCross::new(short_window, long_window)),
            StrategySpec::RsiThreshold {
                window,
                oversold,
                overbought,
            } => Box::new(RsiThreshold::new(window, oversold, overbought)),
        }
    }
}

fn invalid(key: &str, reason: &str) -> QuantError {
    QuantError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::HistoricalRow;
    use chrono::NaiveDate;

    fn single_symbol(closes: &[f64]) -> HistoryTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        HistoryTable::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    HistoricalRow::price(start + chrono::Duration::days(i as i64), "TEST", c, 1.0)
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn ma_cross_literal_rolling_means() {
        let closes = [100.0, 101.0, 102.0, 101.0, 100.0, 99.0, 98.0, 99.0, 100.0, 101.0];
        let history = single_symbol(&closes);
        let table = MovingAverageCross::new(2, 4).generate_signals(&history);

        let short = table.column("sma_short").unwrap();
        let long = table.column("sma_long").unwrap();

        assert!(short[0].is_nan());
        for i in 1..closes.len() {
            let expected = (closes[i - 1] + closes[i]) / 2.0;
            assert!((short[i] - expected).abs() < 1e-12, "sma_short[{}]", i);
        }
        for i in 0..3 {
            assert!(long[i].is_nan());
            assert_eq!(table.signals()[i].direction, SignalDirection::Hold);
        }
        for i in 3..closes.len() {
            let expected = closes[i - 3..=i].iter().sum::<f64>() / 4.0;
            assert!((long[i] - expected).abs() < 1e-12, "sma_long[{}]", i);
            let want = SignalDirection::from_comparison(short[i], long[i]);
            assert_eq!(table.signals()[i].direction, want);
        }
    }

    #[test]
    fn ma_cross_known_directions() {
        let closes = [100.0, 101.0, 102.0, 101.0, 100.0, 99.0, 98.0, 99.0, 100.0, 101.0];
        let table = MovingAverageCross::new(2, 4).generate_signals(&single_symbol(&closes));
        let values: Vec<i8> = table.directions().iter().map(|d| d.value()).collect();
        // row 3: 101.5 > 101.0, row 4: 100.5 < 101.0, row 8: 99.5 > 99.0
        assert_eq!(values, vec![0, 0, 0, 1, -1, -1, -1, -1, 1, 1]);
    }

    #[test]
    fn ma_cross_parameters() {
        let params = MovingAverageCross::default().parameters();
        assert_eq!(params["short_window"], 20.0);
        assert_eq!(params["long_window"], 50.0);
    }

    #[test]
    fn ma_cross_short_history_all_hold() {
        let table = MovingAverageCross::new(2, 4).generate_signals(&single_symbol(&[1.0, 2.0]));
        assert!(table.directions().iter().all(|d| d.is_hold()));
    }

    #[test]
    fn rsi_threshold_signals() {
        // Falling then rising prices: RSI 0 then 100.
        let closes = [10.0, 9.0, 8.0, 7.0, 8.0, 9.0, 10.0];
        let table = RsiThreshold::new(3, 30.0, 70.0).generate_signals(&single_symbol(&closes));
        let values: Vec<i8> = table.directions().iter().map(|d| d.value()).collect();
        assert_eq!(values[0], 0);
        assert_eq!(values[1], 0);
        assert_eq!(values[2], 1);
        assert_eq!(values[3], 1);
        assert_eq!(values[6], -1);
        assert!(table.column("rsi").unwrap()[0].is_nan());
    }

    #[test]
    fn rsi_threshold_flat_prices_hold() {
        let table = RsiThreshold::new(3, 30.0, 70.0).generate_signals(&single_symbol(&[5.0; 6]));
        assert!(table.directions().iter().all(|d| d.is_hold()));
    }

    #[test]
    fn rsi_threshold_parameters() {
        let params = RsiThreshold::default().parameters();
        assert_eq!(params["window"], 14.0);
        assert_eq!(params["oversold"], 30.0);
        assert_eq!(params["overbought"], 70.0);
    }

    #[test]
    fn spec_validation() {
        assert!(StrategySpec::MovingAverageCross {
            short_window: 5,
            long_window: 20
        }
        .validate()
        .is_ok());
        assert!(StrategySpec::MovingAverageCross {
            short_window: 20,
            long_window: 20
        }
        .validate()
        .is_err());
        assert!(StrategySpec::RsiThreshold {
            window: 14,
            oversold: 70.0,
            overbought: 30.0
        }
        .validate()
        .is_err());
        assert!(StrategySpec::RsiThreshold {
            window: 0,
            oversold: 30.0,
            overbought: 70.0
        }
        .validate()
        .is_err());
    }

    #[test]
    fn spec_builds_named_strategy() {
        let strategy = StrategySpec::RsiThreshold {
            window: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
        .build();
        assert_eq!(strategy.name(), "rsi_threshold");
        assert_eq!(strategy.parameters()["window"], 14.0);
    }
}
