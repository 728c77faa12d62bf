//! Cross-sectional factors: per-row numeric scores derived from one column
//! of the history table.
//!
//! Every factor returns a series aligned to the table's rows. Missing
//! optional values produce `NaN` in that row; IEEE results such as `1/0` or
//! `ln(0)` are kept as they are.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::error::FactorError;
use super::history::{Column, HistoryTable};
use super::indicator::{pct_change, rolling_std};
use super::indicator_helpers::per_symbol;

pub const DEFAULT_MOMENTUM_LOOKBACK: usize = 252;
pub const DEFAULT_VOLATILITY_WINDOW: usize = 252;

pub trait Factor: fmt::Debug + Send + Sync {
    /// Stable column name, e.g. `value_factor`.
    fn name(&self) -> &str;

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError>;
}

fn require(history: &HistoryTable, column: Column, factor: &str) -> Result<Vec<f64>, FactorError> {
    history
        .column(column)
        .ok_or_else(|| FactorError::MissingColumn {
            factor: factor.to_string(),
            column: column.name().to_string(),
        })
}

fn check_window(window: usize, factor: &str) -> Result<(), FactorError> {
    if window == 0 {
        return Err(FactorError::InvalidWindow {
            factor: factor.to_string(),
            window,
        });
    }
    Ok(())
}

/// 1 / pe_ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFactor;

impl Factor for ValueFactor {
    fn name(&self) -> &str {
        "value_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        let pe = require(history, Column::PeRatio, self.name())?;
        Ok(pe.into_iter().map(|v| 1.0 / v).collect())
    }
}

/// Close-to-close percentage change over `lookback` rows of the same symbol.
#[derive(Debug, Clone, Copy)]
pub struct MomentumFactor {
    pub lookback: usize,
}

impl Default for MomentumFactor {
    fn default() -> Self {
        MomentumFactor {
            lookback: DEFAULT_MOMENTUM_LOOKBACK,
        }
    }
}

impl Factor for MomentumFactor {
    fn name(&self) -> &str {
        "momentum_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        check_window(self.lookback, self.name())?;
        let close = require(history, Column::Close, self.name())?;
        Ok(per_symbol(history, &close, |s| pct_change(s, self.lookback)))
    }
}

/// Return on equity, passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityFactor;

impl Factor for QualityFactor {
    fn name(&self) -> &str {
        "quality_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        require(history, Column::Roe, self.name())
    }
}

/// -ln(market_cap); smaller companies score higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeFactor;

impl Factor for SizeFactor {
    fn name(&self) -> &str {
        "size_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        let cap = require(history, Column::MarketCap, self.name())?;
        Ok(cap.into_iter().map(|v| -v.ln()).collect())
    }
}

/// Negated rolling sample std of daily returns; calmer names score higher.
#[derive(Debug, Clone, Copy)]
pub struct VolatilityFactor {
    pub window: usize,
}

impl Default for VolatilityFactor {
    fn default() -> Self {
        VolatilityFactor {
            window: DEFAULT_VOLATILITY_WINDOW,
        }
    }
}

impl Factor for VolatilityFactor {
    fn name(&self) -> &str {
        "volatility_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        check_window(self.window, self.name())?;
        let close = require(history, Column::Close, self.name())?;
        Ok(per_symbol(history, &close, |s| {
            rolling_std(&pct_change(s, 1), self.window)
                .into_iter()
                .map(|v| -v)
                .collect()
        }))
    }
}

/// ln(turnover)
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidityFactor;

impl Factor for LiquidityFactor {
    fn name(&self) -> &str {
        "liquidity_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        let turnover = require(history, Column::Turnover, self.name())?;
        Ok(turnover.into_iter().map(f64::ln).collect())
    }
}

/// Net profit growth, passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthFactor;

impl Factor for GrowthFactor {
    fn name(&self) -> &str {
        "growth_factor"
    }

    fn calculate(&self, history: &HistoryTable) -> Result<Vec<f64>, FactorError> {
        require(history, Column::NetProfitGrowth, self.name())
    }
}

/// Names of the built-in factors, in registry order.
pub const BUILTIN_FACTORS: [&str; 7] = [
    "growth_factor",
    "liquidity_factor",
    "momentum_factor",
    "quality_factor",
    "size_factor",
    "value_factor",
    "volatility_factor",
];

/// One flattened factor observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorValue {
    pub date: NaiveDate,
    pub symbol: String,
    pub factor_name: String,
    pub value: f64,
}

/// Factor columns aligned to the (date, symbol) rows of a history table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorTable {
    keys: Vec<(NaiveDate, String)>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl FactorTable {
    /// Empty table keyed by `history`'s rows.
    pub fn new(history: &HistoryTable) -> Self {
        FactorTable {
            keys: history
                .rows()
                .iter()
                .map(|r| (r.date, r.symbol.clone()))
                .collect(),
            columns: BTreeMap::new(),
        }
    }

    /// Add or replace a column. Returns `false` if `values` is not aligned
    /// to the table's rows.
    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> bool {
        if values.len() != self.keys.len() {
            return false;
        }
        self.columns.insert(name.to_string(), values);
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[(NaiveDate, String)] {
        &self.keys
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// One record per (date, symbol, factor), rows in table order and
    /// factors in name order.
    pub fn to_records(&self) -> Vec<FactorValue> {
        let mut records = Vec::with_capacity(self.keys.len() * self.columns.len());
        for (i, (date, symbol)) in self.keys.iter().enumerate() {
            for (name, values) in &self.columns {
                records.push(FactorValue {
                    date: *date,
                    symbol: symbol.clone(),
                    factor_name: name.clone(),
                    value: values[i],
                });
            }
        }
        records
    }
}
