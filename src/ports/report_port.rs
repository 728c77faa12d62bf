//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;
use crate::domain::factor::FactorTable;
use std::path::Path;

/// Port for writing backtest and factor results.
pub trait ReportPort {
    fn write_backtest(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), QuantError>;

    fn write_factors(&self, table: &FactorTable, output_dir: &Path) -> Result<(), QuantError>;
}
