//! Trading signals produced by strategies.

use crate::domain::history::HistoryTable;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "i8")]
pub enum SignalDirection {
    Sell,
    Hold,
    Buy,
}

impl SignalDirection {
    pub fn value(self) -> i8 {
        match self {
            SignalDirection::Sell => -1,
            SignalDirection::Hold => 0,
            SignalDirection::Buy => 1,
        }
    }

    /// +1 when `a > b`, -1 when `a < b`, 0 when equal or either is undefined.
    pub fn from_comparison(a: f64, b: f64) -> Self {
        if a > b {
            SignalDirection::Buy
        } else if a < b {
            SignalDirection::Sell
        } else {
            SignalDirection::Hold
        }
    }

    pub fn is_hold(self) -> bool {
        self == SignalDirection::Hold
    }
}

impl From<SignalDirection> for i8 {
    fn from(direction: SignalDirection) -> Self {
        direction.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub symbol: String,
    pub direction: SignalDirection,
    pub price: f64,
}

/// One signal per history row, in table order, plus the named auxiliary
/// series the strategy computed along the way (`NaN` during warm-up).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalTable {
    signals: Vec<Signal>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl SignalTable {
    /// Pair each history row with its direction. The price is the row close.
    /// Extra rows or directions are dropped; the backtest engine rejects a
    /// table whose length differs from its history.
    pub fn from_history(history: &HistoryTable, directions: Vec<SignalDirection>) -> Self {
        let signals = history
            .rows()
            .iter()
            .zip(directions)
            .map(|(row, direction)| Signal {
                date: row.date,
                symbol: row.symbol.clone(),
                direction,
                price: row.close,
            })
            .collect();
        SignalTable {
            signals,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Self {
        self.columns.insert(name.to_string(), values);
        self
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Signals for a row span of the originating history table.
    pub fn span(&self, rows: Range<usize>) -> &[Signal] {
        &self.signals[rows]
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn directions(&self) -> Vec<SignalDirection> {
        self.signals.iter().map(|s| s.direction).collect()
    }
}
