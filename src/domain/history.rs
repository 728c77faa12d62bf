//! Historical price/fundamental table.
//!
//! Rows are kept sorted by `(date, symbol)` so that one trading date is a
//! contiguous span, and per-symbol row indices are kept in date order for
//! windowed computations.

use crate::domain::error::QuantError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub close: f64,
    pub volume: f64,
    pub pe_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub market_cap: Option<f64>,
    pub turnover: Option<f64>,
    pub net_profit_growth: Option<f64>,
}

impl HistoricalRow {
    /// A row carrying only price and volume.
    pub fn price(date: NaiveDate, symbol: &str, close: f64, volume: f64) -> Self {
        HistoricalRow {
            date,
            symbol: symbol.to_string(),
            close,
            volume,
            pe_ratio: None,
            roe: None,
            market_cap: None,
            turnover: None,
            net_profit_growth: None,
        }
    }

    pub fn get(&self, column: Column) -> Option<f64> {
        match column {
            Column::Close => Some(self.close),
            Column::Volume => Some(self.volume),
            Column::PeRatio => self.pe_ratio,
            Column::Roe => self.roe,
            Column::MarketCap => self.market_cap,
            Column::Turnover => self.turnover,
            Column::NetProfitGrowth => self.net_profit_growth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Close,
    Volume,
    PeRatio,
    Roe,
    MarketCap,
    Turnover,
    NetProfitGrowth,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Close => "close",
            Column::Volume => "volume",
            Column::PeRatio => "pe_ratio",
            Column::Roe => "roe",
            Column::MarketCap => "market_cap",
            Column::Turnover => "turnover",
            Column::NetProfitGrowth => "net_profit_growth",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The rows of one trading date, as a span into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSpan {
    pub date: NaiveDate,
    pub rows: Range<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryTable {
    rows: Vec<HistoricalRow>,
    spans: Vec<DateSpan>,
    by_symbol: BTreeMap<String, Vec<usize>>,
}

impl HistoryTable {
    /// Sort and index `rows`. A repeated `(date, symbol)` pair is rejected.
    pub fn new(mut rows: Vec<HistoricalRow>) -> Result<Self, QuantError> {
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));

        for pair in rows.windows(2) {
            if pair[0].date == pair[1].date && pair[0].symbol == pair[1].symbol {
                return Err(QuantError::DuplicateRow {
                    symbol: pair[1].symbol.clone(),
                    date: pair[1].date,
                });
            }
        }

        let mut table = HistoryTable {
            rows,
            ..Default::default()
        };
        table.reindex();
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[HistoricalRow] {
        &self.rows
    }

    /// Trading dates in ascending order with their row spans.
    pub fn date_spans(&self) -> &[DateSpan] {
        &self.spans
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.spans.iter().map(|s| s.date).collect()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.by_symbol.keys().map(String::as_str)
    }

    /// Row indices of `symbol` in ascending date order.
    pub fn symbol_rows(&self, symbol: &str) -> Option<&[usize]> {
        self.by_symbol.get(symbol).map(Vec::as_slice)
    }

    pub fn symbol_groups(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.by_symbol
            .iter()
            .map(|(symbol, rows)| (symbol.as_str(), rows.as_slice()))
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.rows.iter().any(|r| r.get(column).is_some())
    }

    /// Column values aligned to rows, `NaN` where a row lacks the value.
    /// `None` when no row carries the column at all.
    pub fn column(&self, column: Column) -> Option<Vec<f64>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| r.get(column).unwrap_or(f64::NAN))
                .collect(),
        )
    }

    /// Rows with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> HistoryTable {
        let rows: Vec<HistoricalRow> = self
            .rows
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect();
        // Already sorted and unique.
        let mut table = HistoryTable {
            rows,
            ..Default::default()
        };
        table.reindex();
        table
    }

    fn reindex(&mut self) {
        self.spans.clear();
        self.by_symbol.clear();
        for (i, row) in self.rows.iter().enumerate() {
            match self.spans.last_mut() {
                Some(span) if span.date == row.date => span.rows.end = i + 1,
                _ => self.spans.push(DateSpan {
                    date: row.date,
                    rows: i..i + 1,
                }),
            }
            self.by_symbol.entry(row.symbol.clone()).or_default().push(i);
        }
    }
}
