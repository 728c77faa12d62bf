//! Daily all-or-nothing risk gate.
//!
//! The gate sees the whole batch of signals for one date and either admits
//! every resulting trade or none of them. It is stateless and depends only
//! on the current portfolio and the proposed signals; prices come from the
//! signals themselves.

use serde::Serialize;

use super::execution::position_size;
use super::logging::Logger;
use super::portfolio::{Portfolio, PriceMap};
use super::signal::{Signal, SignalDirection};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskConfig {
    /// Largest fraction of marked portfolio value a single position may
    /// reach after a buy. 0 disables.
    pub max_position_size: f64,
    /// Refuse to add to a holding trading at or below cost * (1 - stop_loss).
    pub stop_loss: f64,
    /// Refuse to add to a holding trading at or above cost * (1 + take_profit).
    pub take_profit: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            max_position_size: 0.1,
            stop_loss: 0.08,
            take_profit: 0.15,
        }
    }
}

/// The first limit a day's batch violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskBreach {
    #[error("sell of {requested} {symbol} exceeds held {held}")]
    Oversell {
        symbol: String,
        held: u64,
        requested: u64,
    },

    #[error("buys require {required:.2} but cash is {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("{symbol} would reach {fraction:.4} of portfolio value, limit {limit:.4}")]
    PositionSize {
        symbol: String,
        fraction: f64,
        limit: f64,
    },

    #[error("{symbol} at {price:.4} is past stop-loss from cost {average_cost:.4}")]
    StopLoss {
        symbol: String,
        price: f64,
        average_cost: f64,
    },

    #[error("{symbol} at {price:.4} is past take-profit from cost {average_cost:.4}")]
    TakeProfit {
        symbol: String,
        price: f64,
        average_cost: f64,
    },
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    logger: Logger,
}

impl RiskManager {
    pub fn new(config: RiskConfig, logger: Logger) -> Self {
        RiskManager { config, logger }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// `true` when every trade implied by `day_signals` may execute.
    pub fn check_limits(&self, portfolio: &Portfolio, day_signals: &[Signal]) -> bool {
        match self.evaluate(portfolio, day_signals) {
            Ok(()) => true,
            Err(breach) => {
                self.logger.debug(format_args!("risk gate closed: {breach}"));
                false
            }
        }
    }

    /// Checks, in order: oversell, cash, position size, stop-loss,
    /// take-profit. Signals that size to zero shares are ignored.
    pub fn evaluate(&self, portfolio: &Portfolio, day_signals: &[Signal]) -> Result<(), RiskBreach> {
        let cash = portfolio.cash();
        let sized: Vec<(&Signal, u64)> = day_signals
            .iter()
            .filter(|s| !s.direction.is_hold())
            .map(|s| (s, position_size(cash, s.price)))
            .filter(|&(_, qty)| qty > 0)
            .collect();

        if sized.is_empty() {
            return Ok(());
        }

        for &(signal, qty) in sized
            .iter()
            .filter(|(s, _)| s.direction == SignalDirection::Sell)
        {
            let held = portfolio.quantity(&signal.symbol);
            if qty > held {
                return Err(RiskBreach::Oversell {
                    symbol: signal.symbol.clone(),
                    held,
                    requested: qty,
                });
            }
        }

        let commission = portfolio.commission();
        let required: f64 = sized
            .iter()
            .map(|&(signal, qty)| {
                let notional = qty as f64 * signal.price;
                let fee = commission.commission(notional);
                match signal.direction {
                    SignalDirection::Buy => notional + fee,
                    // A sale only drains cash when its fee exceeds proceeds.
                    _ => (fee - notional).max(0.0),
                }
            })
            .sum();
        if required > cash {
            return Err(RiskBreach::InsufficientCash {
                required,
                available: cash,
            });
        }

        let buys: Vec<(&Signal, u64)> = sized
            .iter()
            .copied()
            .filter(|(s, _)| s.direction == SignalDirection::Buy)
            .collect();

        if self.config.max_position_size > 0.0 && !buys.is_empty() {
            let marked = marked_value(portfolio, day_signals);
            for &(signal, qty) in &buys {
                let held = portfolio.quantity(&signal.symbol);
                let exposure = (held + qty) as f64 * signal.price;
                let fraction = if marked > 0.0 {
                    exposure / marked
                } else {
                    f64::INFINITY
                };
                if fraction > self.config.max_position_size {
                    return Err(RiskBreach::PositionSize {
                        symbol: signal.symbol.clone(),
                        fraction,
                        limit: self.config.max_position_size,
                    });
                }
            }
        }

        for &(signal, _) in &buys {
            let Some(position) = portfolio.position(&signal.symbol) else {
                continue;
            };
            if position.should_stop_loss(signal.price, self.config.stop_loss) {
                return Err(RiskBreach::StopLoss {
                    symbol: signal.symbol.clone(),
                    price: signal.price,
                    average_cost: position.average_cost,
                });
            }
            if position.should_take_profit(signal.price, self.config.take_profit) {
                return Err(RiskBreach::TakeProfit {
                    symbol: signal.symbol.clone(),
                    price: signal.price,
                    average_cost: position.average_cost,
                });
            }
        }

        Ok(())
    }
}

/// Cash plus holdings at the day's signal prices, falling back to average
/// cost for symbols without a signal that day.
fn marked_value(portfolio: &Portfolio, day_signals: &[Signal]) -> f64 {
    let mut prices: PriceMap = day_signals
        .iter()
        .map(|s| (s.symbol.clone(), s.price))
        .collect();
    for (symbol, position) in portfolio.positions_snapshot() {
        prices.entry(symbol).or_insert(position.average_cost);
    }
    portfolio.total_value(&prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::CommissionConfig;
    use crate::domain::position::{Trade, TradeSide};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn signal(symbol: &str, direction: SignalDirection, price: f64) -> Signal {
        Signal {
            date: date(),
            symbol: symbol.to_string(),
            direction,
            price,
        }
    }

    fn portfolio(cash: f64) -> Portfolio {
        Portfolio::new(cash, CommissionConfig::default(), Logger::silent())
    }

    fn buy(p: &mut Portfolio, symbol: &str, price: f64, quantity: u64) {
        p.execute_trade(&Trade {
            date: date(),
            symbol: symbol.to_string(),
            side: TradeSide::Buy,
            price,
            quantity,
        })
        .unwrap();
    }

    fn manager(config: RiskConfig) -> RiskManager {
        RiskManager::new(config, Logger::silent())
    }

    #[test]
    fn hold_only_batch_passes() {
        let p = portfolio(1_000_000.0);
        let batch = vec![signal("A", SignalDirection::Hold, 10.0)];
        assert!(manager(RiskConfig::default()).check_limits(&p, &batch));
        assert!(manager(RiskConfig::default()).check_limits(&p, &[]));
    }

    #[test]
    fn first_buy_at_ten_percent_passes() {
        let p = portfolio(1_000_000.0);
        let batch = vec![signal("A", SignalDirection::Buy, 100.0)];
        assert_eq!(manager(RiskConfig::default()).evaluate(&p, &batch), Ok(()));
    }

    #[test]
    fn sell_without_holding_is_oversell() {
        let p = portfolio(1_000_000.0);
        let batch = vec![
            signal("A", SignalDirection::Buy, 100.0),
            signal("B", SignalDirection::Sell, 100.0),
        ];
        let breach = manager(RiskConfig::default()).evaluate(&p, &batch).unwrap_err();
        assert_eq!(
            breach,
            RiskBreach::Oversell {
                symbol: "B".into(),
                held: 0,
                requested: 1000
            }
        );
    }

    #[test]
    fn sell_within_holding_passes() {
        let mut p = portfolio(1_000_000.0);
        buy(&mut p, "A", 100.0, 1000);
        let batch = vec![signal("A", SignalDirection::Sell, 100.0)];
        assert!(manager(RiskConfig::default()).check_limits(&p, &batch));
    }

    #[test]
    fn too_many_buys_exhaust_cash() {
        let p = portfolio(100_000.0);
        let batch: Vec<Signal> = (0..11)
            .map(|i| signal(&format!("S{i:02}"), SignalDirection::Buy, 10.0))
            .collect();
        let config = RiskConfig {
            max_position_size: 0.0,
            ..RiskConfig::default()
        };
        let breach = manager(config).evaluate(&p, &batch).unwrap_err();
        assert!(matches!(breach, RiskBreach::InsufficientCash { .. }));
    }

    #[test]
    fn position_size_limit_blocks_adding() {
        let mut p = portfolio(1_000_000.0);
        buy(&mut p, "A", 100.0, 1000);
        let batch = vec![signal("A", SignalDirection::Buy, 100.0)];
        let breach = manager(RiskConfig::default()).evaluate(&p, &batch).unwrap_err();
        assert!(matches!(breach, RiskBreach::PositionSize { ref symbol, .. } if symbol == "A"));
    }

    #[test]
    fn stop_loss_blocks_averaging_down() {
        let mut p = portfolio(1_000_000.0);
        buy(&mut p, "A", 100.0, 10);
        let config = RiskConfig {
            max_position_size: 0.0,
            ..RiskConfig::default()
        };
        let batch = vec![signal("A", SignalDirection::Buy, 90.0)];
        let breach = manager(config).evaluate(&p, &batch).unwrap_err();
        assert!(matches!(breach, RiskBreach::StopLoss { .. }));
    }

    #[test]
    fn take_profit_blocks_chasing() {
        let mut p = portfolio(1_000_000.0);
        buy(&mut p, "A", 100.0, 10);
        let config = RiskConfig {
            max_position_size: 0.0,
            ..RiskConfig::default()
        };
        let batch = vec![signal("A", SignalDirection::Buy, 120.0)];
        let breach = manager(config).evaluate(&p, &batch).unwrap_err();
        assert!(matches!(breach, RiskBreach::TakeProfit { .. }));
    }

    #[test]
    fn disabled_limits_pass() {
        let mut p = portfolio(1_000_000.0);
        buy(&mut p, "A", 100.0, 5000);
        let config = RiskConfig {
            max_position_size: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
        };
        let batch = vec![signal("A", SignalDirection::Buy, 200.0)];
        assert!(manager(config).check_limits(&p, &batch));
    }

    #[test]
    fn unsizable_signals_ignored() {
        let p = portfolio(100.0);
        let batch = vec![signal("A", SignalDirection::Sell, 1_000.0)];
        assert!(manager(RiskConfig::default()).check_limits(&p, &batch));
    }
}
