//! Portfolio ledger: cash plus per-symbol long positions.
//!
//! The ledger is mutated only through [`Portfolio::execute_trade`], which
//! either applies a trade completely or rejects it and leaves the state
//! untouched. Cash and position quantities never go negative.

use serde::Serialize;
use std::collections::BTreeMap;

use super::error::PortfolioError;
use super::logging::Logger;
use super::position::{ExecutedTrade, Position, Trade, TradeSide};

/// Latest known price per symbol, supplied by the caller.
pub type PriceMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CommissionConfig {
    /// Flat fee per executed trade.
    pub per_trade: f64,
    /// Fraction of traded notional.
    pub rate: f64,
}

impl CommissionConfig {
    /// per_trade + notional * rate
    pub fn commission(&self, notional: f64) -> f64 {
        self.per_trade + notional * self.rate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash: f64,
    initial_capital: f64,
    positions: BTreeMap<String, Position>,
    commission: CommissionConfig,
    logger: Logger,
}

impl Portfolio {
    pub fn new(initial_capital: f64, commission: CommissionConfig, logger: Logger) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            commission,
            logger,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn commission(&self) -> &CommissionConfig {
        &self.commission
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn quantity(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }

    /// Owned copy of the current positions.
    pub fn positions_snapshot(&self) -> BTreeMap<String, Position> {
        self.positions.clone()
    }

    /// Back to `initial_capital` with no positions.
    pub fn reset(&mut self) {
        self.cash = self.initial_capital;
        self.positions.clear();
    }

    /// Apply `trade` to the ledger.
    ///
    /// Buy: cash -= notional + commission, quantity += trade.quantity.
    /// Sell: cash += notional - commission, quantity -= trade.quantity.
    /// A zero-quantity trade is a no-op and is not charged.
    pub fn execute_trade(&mut self, trade: &Trade) -> Result<ExecutedTrade, PortfolioError> {
        if !trade.price.is_finite() || trade.price <= 0.0 {
            return Err(PortfolioError::InvalidPrice {
                symbol: trade.symbol.clone(),
                price: trade.price,
            });
        }
        if trade.quantity == 0 {
            return Ok(ExecutedTrade::from_trade(trade, 0.0));
        }

        let notional = trade.notional();
        let commission = self.commission.commission(notional);

        match trade.side {
            TradeSide::Buy => {
                let cost = notional + commission;
                if cost > self.cash {
                    return Err(PortfolioError::InsufficientCash {
                        symbol: trade.symbol.clone(),
                        required: cost,
                        available: self.cash,
                    });
                }
                self.cash -= cost;
                self.positions
                    .entry(trade.symbol.clone())
                    .or_insert_with(|| Position::new(&trade.symbol))
                    .add(trade.quantity, trade.price);
            }
            TradeSide::Sell => {
                let held = self.quantity(&trade.symbol);
                if trade.quantity > held {
                    return Err(PortfolioError::Oversell {
                        symbol: trade.symbol.clone(),
                        held,
                        requested: trade.quantity,
                    });
                }
                let proceeds = notional - commission;
                if self.cash + proceeds < 0.0 {
                    return Err(PortfolioError::InsufficientCash {
                        symbol: trade.symbol.clone(),
                        required: -proceeds,
                        available: self.cash,
                    });
                }
                self.cash += proceeds;
                let remaining = held - trade.quantity;
                if remaining == 0 {
                    self.positions.remove(&trade.symbol);
                } else if let Some(pos) = self.positions.get_mut(&trade.symbol) {
                    pos.quantity = remaining;
                }
            }
        }

        self.logger.debug(format_args!(
            "{} {} {} @ {:.4} (commission {:.4}, cash {:.2})",
            trade.side, trade.quantity, trade.symbol, trade.price, commission, self.cash
        ));

        Ok(ExecutedTrade::from_trade(trade, commission))
    }

    /// cash + sum(quantity * price). Positions without a supplied price
    /// contribute nothing.
    pub fn total_value(&self, prices: &PriceMap) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| match prices.get(&pos.symbol) {
                Some(&price) => pos.market_value(price),
                None => {
                    self.logger.warn(format_args!(
                        "no price for {}; valuing {} shares at 0",
                        pos.symbol, pos.quantity
                    ));
                    0.0
                }
            })
            .sum();
        self.cash + position_value
    }
}
