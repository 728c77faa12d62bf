#![allow(dead_code)]

use chrono::NaiveDate;
use quantstock::domain::backtest::{BacktestConfig, BacktestResult};
use quantstock::domain::error::QuantError;
use quantstock::domain::factor::FactorTable;
use quantstock::domain::history::{HistoricalRow, HistoryTable};
use quantstock::ports::data_port::HistoryPort;
use quantstock::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct MockHistoryPort {
    pub data: BTreeMap<String, Vec<HistoricalRow>>,
    pub errors: BTreeMap<String, String>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<HistoricalRow>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl HistoryPort for MockHistoryPort {
    fn load_history(
        &self,
        symbols: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<HistoryTable, QuantError> {
        let symbols: Vec<String> = if symbols.is_empty() {
            self.data.keys().cloned().collect()
        } else {
            symbols.to_vec()
        };

        let mut rows = Vec::new();
        for symbol in &symbols {
            if let Some(reason) = self.errors.get(symbol) {
                return Err(QuantError::DataLoad {
                    reason: reason.clone(),
                });
            }
            let Some(data) = self.data.get(symbol) else {
                return Err(QuantError::NoData {
                    symbol: symbol.clone(),
                });
            };
            rows.extend(
                data.iter()
                    .filter(|r| start.is_none_or(|s| r.date >= s) && end.is_none_or(|e| r.date <= e))
                    .cloned(),
            );
        }
        HistoryTable::new(rows)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        Ok(self.data.keys().cloned().collect())
    }
}

/// Records what it was asked to write instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingReport {
    pub backtests: RefCell<Vec<(BacktestResult, PathBuf)>>,
    pub factors: RefCell<Vec<(FactorTable, PathBuf)>>,
}

impl ReportPort for RecordingReport {
    fn write_backtest(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), QuantError> {
        self.backtests
            .borrow_mut()
            .push((result.clone(), output_dir.to_path_buf()));
        Ok(())
    }

    fn write_factors(&self, table: &FactorTable, output_dir: &Path) -> Result<(), QuantError> {
        self.factors
            .borrow_mut()
            .push((table.clone(), output_dir.to_path_buf()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_row(symbol: &str, date: &str, close: f64) -> HistoricalRow {
    HistoricalRow::price(
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        symbol,
        close,
        10_000.0,
    )
}

/// Price rows with a full set of fundamentals.
pub fn make_fundamental_row(symbol: &str, date: NaiveDate, close: f64) -> HistoricalRow {
    HistoricalRow {
        pe_ratio: Some(15.0 + close / 100.0),
        roe: Some(0.12),
        market_cap: Some(close * 1e8),
        turnover: Some(0.02),
        net_profit_growth: Some(0.08),
        ..HistoricalRow::price(date, symbol, close, 10_000.0)
    }
}

/// `count` consecutive days of closes following a slow sine wave around
/// `base`, so moving-average crosses occur in both directions.
pub fn generate_rows(symbol: &str, start_date: &str, count: usize, base: f64) -> Vec<HistoricalRow> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = base + base * 0.1 * (i as f64 / 7.0).sin();
            make_fundamental_row(symbol, start + chrono::Duration::days(i as i64), close)
        })
        .collect()
}

pub fn rows_from_closes(symbol: &str, closes: &[f64]) -> Vec<HistoricalRow> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| HistoricalRow::price(start + chrono::Duration::days(i as i64), symbol, c, 1.0))
        .collect()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::default()
}
