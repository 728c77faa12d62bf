//! Shared helpers for applying series transforms to a multi-symbol table.

use crate::domain::history::HistoryTable;

/// Apply `transform` to each symbol's slice of `column` (in date order) and
/// scatter the results back into table row order.
///
/// `column` must be aligned to `history` rows. `transform` must return a
/// series of the same length as its input.
pub fn per_symbol<F>(history: &HistoryTable, column: &[f64], transform: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut out = vec![f64::NAN; history.len()];
    for (_, rows) in history.symbol_groups() {
        let series: Vec<f64> = rows.iter().map(|&i| column[i]).collect();
        let transformed = transform(&series);
        debug_assert_eq!(transformed.len(), rows.len());
        for (&i, value) in rows.iter().zip(transformed) {
            out[i] = value;
        }
    }
    out
}

/// Close prices aligned to table rows.
pub fn closes(history: &HistoryTable) -> Vec<f64> {
    history.rows().iter().map(|r| r.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::HistoricalRow;
    use crate::domain::indicator::pct_change;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn windows_do_not_cross_symbols() {
        let table = HistoryTable::new(vec![
            HistoricalRow::price(d(1), "A", 10.0, 1.0),
            HistoricalRow::price(d(1), "B", 100.0, 1.0),
            HistoricalRow::price(d(2), "A", 11.0, 1.0),
            HistoricalRow::price(d(2), "B", 50.0, 1.0),
        ])
        .unwrap();

        let pct = per_symbol(&table, &closes(&table), |s| pct_change(s, 1));

        // Row order: (1,A), (1,B), (2,A), (2,B)
        assert!(pct[0].is_nan());
        assert!(pct[1].is_nan());
        assert!((pct[2] - 0.1).abs() < 1e-12);
        assert!((pct[3] - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn empty_table_yields_empty_series() {
        let table = HistoryTable::new(vec![]).unwrap();
        assert!(per_symbol(&table, &[], |s| s.to_vec()).is_empty());
    }
}
