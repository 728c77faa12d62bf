//! Historical data access port trait.

use crate::domain::error::QuantError;
use crate::domain::history::HistoryTable;
use chrono::NaiveDate;

pub trait HistoryPort {
    /// Rows for `symbols` with `start <= date <= end`; an open bound is
    /// unbounded on that side.
    fn load_history(
        &self,
        symbols: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<HistoryTable, QuantError>;

    /// Every symbol the source can serve, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, QuantError>;
}
