//! CSV file history adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row.
//! `date`, `close` and `volume` are required; the fundamental columns may be
//! absent entirely or left empty per row.

use crate::domain::error::QuantError;
use crate::domain::history::{HistoricalRow, HistoryTable};
use crate::ports::data_port::HistoryPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    close: f64,
    volume: f64,
    #[serde(default)]
    pe_ratio: Option<f64>,
    #[serde(default)]
    roe: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    turnover: Option<f64>,
    #[serde(default)]
    net_profit_growth: Option<f64>,
}

impl CsvRow {
    fn into_row(self, symbol: &str) -> HistoricalRow {
        HistoricalRow {
            date: self.date,
            symbol: symbol.to_string(),
            close: self.close,
            volume: self.volume,
            pe_ratio: self.pe_ratio,
            roe: self.roe,
            market_cap: self.market_cap,
            turnover: self.turnover,
            net_profit_growth: self.net_profit_growth,
        }
    }
}

pub struct CsvHistoryAdapter {
    base_path: PathBuf,
}

impl CsvHistoryAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_symbol(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<HistoricalRow>, QuantError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(QuantError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for result in rdr.deserialize::<CsvRow>() {
            let record = result.map_err(|e| QuantError::DataLoad {
                reason: format!("{}: {}", path.display(), e),
            })?;
            if start.is_some_and(|s| record.date < s) || end.is_some_and(|e| record.date > e) {
                continue;
            }
            rows.push(record.into_row(symbol));
        }
        Ok(rows)
    }
}

impl HistoryPort for CsvHistoryAdapter {
    /// An empty `symbols` slice loads every symbol in the directory.
    fn load_history(
        &self,
        symbols: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<HistoryTable, QuantError> {
        let symbols = if symbols.is_empty() {
            self.list_symbols()?
        } else {
            symbols.to_vec()
        };

        let mut rows = Vec::new();
        for symbol in &symbols {
            rows.extend(self.read_symbol(symbol, start, end)?);
        }
        HistoryTable::new(rows)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| QuantError::DataLoad {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
