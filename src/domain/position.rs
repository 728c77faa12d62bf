//! Positions and trades.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    /// Quantity-weighted buy price. Sells leave it unchanged.
    pub average_cost: f64,
}

impl Position {
    pub fn new(symbol: &str) -> Self {
        Position {
            symbol: symbol.to_string(),
            quantity: 0,
            average_cost: 0.0,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    /// Price has fallen to or below `average_cost * (1 - fraction)`.
    /// A zero fraction disables the check.
    pub fn should_stop_loss(&self, price: f64, fraction: f64) -> bool {
        if fraction <= 0.0 || self.quantity == 0 {
            return false;
        }
        price <= self.average_cost * (1.0 - fraction)
    }

    /// Price has risen to or above `average_cost * (1 + fraction)`.
    /// A zero fraction disables the check.
    pub fn should_take_profit(&self, price: f64, fraction: f64) -> bool {
        if fraction <= 0.0 || self.quantity == 0 {
            return false;
        }
        price >= self.average_cost * (1.0 + fraction)
    }

    pub(crate) fn add(&mut self, quantity: u64, price: f64) {
        let total = self.quantity + quantity;
        if total > 0 {
            self.average_cost = (self.average_cost * self.quantity as f64
                + price * quantity as f64)
                / total as f64;
        }
        self.quantity = total;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.write_str("buy"),
            TradeSide::Sell => f.write_str("sell"),
        }
    }
}

/// An order the engine asks the portfolio to fill at `price`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: u64,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A trade as applied to the ledger, with the commission charged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedTrade {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: u64,
    pub commission: f64,
}

impl ExecutedTrade {
    pub fn from_trade(trade: &Trade, commission: f64) -> Self {
        ExecutedTrade {
            date: trade.date,
            symbol: trade.symbol.clone(),
            side: trade.side,
            price: trade.price,
            quantity: trade.quantity,
            commission,
        }
    }
}
