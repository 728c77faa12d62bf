//! Flat-file report adapter implementing ReportPort.
//!
//! A backtest writes `snapshots.csv`, `trades.csv` and `metrics.json` into
//! the output directory; a factor run writes `factors.csv`. Undefined
//! (`NaN`) factor values are written as empty cells.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::domain::backtest::{BacktestResult, DailySnapshot};
use crate::domain::error::QuantError;
use crate::domain::factor::FactorTable;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::strategy::StrategyParameters;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct MetricsReport<'a> {
    strategy: &'a str,
    parameters: &'a StrategyParameters,
    metrics: &'a PerformanceMetrics,
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, QuantError> {
    let data = wtr.into_inner().map_err(|e| QuantError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|e| QuantError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// `SYM:QTY` pairs joined by `;`, in symbol order.
fn format_positions(snapshot: &DailySnapshot) -> String {
    snapshot
        .positions
        .values()
        .map(|p| format!("{}:{}", p.symbol, p.quantity))
        .collect::<Vec<_>>()
        .join(";")
}

/// Columns: date, portfolio_value, cash, positions, trade_count
pub fn export_snapshots_csv(snapshots: &[DailySnapshot]) -> Result<String, QuantError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "portfolio_value", "cash", "positions", "trade_count"])?;
    for s in snapshots {
        wtr.write_record([
            &s.date.to_string(),
            &s.portfolio_value.to_string(),
            &s.cash.to_string(),
            &format_positions(s),
            &s.trades.len().to_string(),
        ])?;
    }
    finish(wtr)
}

/// Every executed trade in date order, one row each.
pub fn export_trades_csv(snapshots: &[DailySnapshot]) -> Result<String, QuantError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(["date", "symbol", "side", "price", "quantity", "commission"])?;
    for trade in snapshots.iter().flat_map(|s| &s.trades) {
        wtr.serialize(trade)?;
    }
    finish(wtr)
}

pub fn export_metrics_json(result: &BacktestResult) -> Result<String, QuantError> {
    let report = MetricsReport {
        strategy: &result.strategy,
        parameters: &result.parameters,
        metrics: &result.metrics,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Columns: date, symbol, then one column per factor in name order.
pub fn export_factors_csv(table: &FactorTable) -> Result<String, QuantError> {
    let names: Vec<&str> = table.factor_names().collect();
    let columns: Vec<&[f64]> = names.iter().filter_map(|n| table.column(n)).collect();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date", "symbol"];
    header.extend(&names);
    wtr.write_record(&header)?;

    for (i, (date, symbol)) in table.keys().iter().enumerate() {
        let mut record = vec![date.to_string(), symbol.clone()];
        record.extend(columns.iter().map(|col| {
            let v = col[i];
            if v.is_nan() { String::new() } else { v.to_string() }
        }));
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), QuantError> {
        fs::create_dir_all(output_dir)?;
        fs::write(
            output_dir.join("snapshots.csv"),
            export_snapshots_csv(&result.snapshots)?,
        )?;
        fs::write(
            output_dir.join("trades.csv"),
            export_trades_csv(&result.snapshots)?,
        )?;
        fs::write(output_dir.join("metrics.json"), export_metrics_json(result)?)?;
        Ok(())
    }

    fn write_factors(&self, table: &FactorTable, output_dir: &Path) -> Result<(), QuantError> {
        fs::create_dir_all(output_dir)?;
        fs::write(output_dir.join("factors.csv"), export_factors_csv(table)?)?;
        Ok(())
    }
}
