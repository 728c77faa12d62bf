//! Backtest engine and its daily event loop.
//!
//! One run is a single synchronous pass: signals are generated once, then
//! trading dates are processed strictly in ascending order, since each day's
//! sizing depends on the cash left by the previous day.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::error::QuantError;
use super::execution::build_day_trades;
use super::history::HistoryTable;
use super::logging::Logger;
use super::metrics::{PerformanceAnalyzer, PerformanceMetrics};
use super::portfolio::{CommissionConfig, Portfolio, PriceMap};
use super::position::{ExecutedTrade, Position};
use super::risk::{RiskConfig, RiskManager};
use super::strategy::{Strategy, StrategyParameters};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission: CommissionConfig,
    pub risk: RiskConfig,
    /// Inclusive bounds applied to data passed to `set_data`.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 1_000_000.0,
            commission: CommissionConfig::default(),
            risk: RiskConfig::default(),
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub cash: f64,
    pub positions: BTreeMap<String, Position>,
    pub trades: Vec<ExecutedTrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub parameters: StrategyParameters,
    pub metrics: PerformanceMetrics,
    pub snapshots: Vec<DailySnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestState {
    Uninitialized,
    DataSet,
    StrategySet,
    Ready,
    Running,
    Completed,
}

impl fmt::Display for BacktestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BacktestState::Uninitialized => "uninitialized",
            BacktestState::DataSet => "data set",
            BacktestState::StrategySet => "strategy set",
            BacktestState::Ready => "ready",
            BacktestState::Running => "running",
            BacktestState::Completed => "completed",
        };
        f.write_str(name)
    }
}

pub struct BacktestEngine {
    config: BacktestConfig,
    portfolio: Portfolio,
    risk_manager: RiskManager,
    analyzer: PerformanceAnalyzer,
    data: Option<HistoryTable>,
    strategy: Option<Box<dyn Strategy>>,
    results: Option<BacktestResult>,
    state: BacktestState,
    logger: Logger,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, logger: Logger) -> Self {
        BacktestEngine {
            portfolio: Portfolio::new(
                config.initial_capital,
                config.commission,
                logger.child("portfolio"),
            ),
            risk_manager: RiskManager::new(config.risk, logger.child("risk")),
            analyzer: PerformanceAnalyzer::new(logger.child("performance")),
            config,
            data: None,
            strategy: None,
            results: None,
            state: BacktestState::Uninitialized,
            logger,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn state(&self) -> BacktestState {
        self.state
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Install the history table, restricted to the configured date range.
    pub fn set_data(&mut self, data: HistoryTable) {
        let data = match (self.config.start_date, self.config.end_date) {
            (None, None) => data,
            (start, end) => data.between(
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            ),
        };
        self.logger.info(format_args!(
            "data set: {} rows, {} dates",
            data.len(),
            data.date_spans().len()
        ));
        self.data = Some(data);
        self.inputs_changed();
    }

    pub fn set_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.logger
            .info(format_args!("strategy set: {}", strategy.name()));
        self.strategy = Some(strategy);
        self.inputs_changed();
    }

    fn inputs_changed(&mut self) {
        self.results = None;
        self.state = match (self.data.is_some(), self.strategy.is_some()) {
            (false, false) => BacktestState::Uninitialized,
            (true, false) => BacktestState::DataSet,
            (false, true) => BacktestState::StrategySet,
            (true, true) => BacktestState::Ready,
        };
    }

    /// Run one full pass over the data. The portfolio is reset first, so
    /// repeated runs are independent.
    pub fn run_backtest(&mut self) -> Result<&BacktestResult, QuantError> {
        let data = self.data.as_ref().ok_or(QuantError::MissingData)?;
        let strategy = self.strategy.as_ref().ok_or(QuantError::MissingStrategy)?;

        self.state = BacktestState::Running;
        self.logger.info(format_args!(
            "running {} over {} dates",
            strategy.name(),
            data.date_spans().len()
        ));

        let snapshots = match simulate(
            data,
            strategy.as_ref(),
            &mut self.portfolio,
            &self.risk_manager,
            &self.logger,
        ) {
            Ok(snapshots) => snapshots,
            Err(err) => {
                self.logger.error(format_args!("backtest aborted: {err}"));
                self.results = None;
                self.state = BacktestState::Ready;
                return Err(err);
            }
        };

        let metrics = self.analyzer.analyze(&snapshots);
        self.results = Some(BacktestResult {
            strategy: strategy.name().to_string(),
            parameters: strategy.parameters(),
            metrics,
            snapshots,
        });
        self.state = BacktestState::Completed;
        self.logger.info(format_args!("backtest completed"));

        self.results.as_ref().ok_or(QuantError::NoResults)
    }

    pub fn results(&self) -> Result<&BacktestResult, QuantError> {
        self.results.as_ref().ok_or(QuantError::NoResults)
    }
}

fn simulate(
    data: &HistoryTable,
    strategy: &dyn Strategy,
    portfolio: &mut Portfolio,
    risk_manager: &RiskManager,
    logger: &Logger,
) -> Result<Vec<DailySnapshot>, QuantError> {
    portfolio.reset();
    let signals = strategy.generate_signals(data);
    if signals.len() != data.len() {
        return Err(QuantError::StrategyOutput {
            strategy: strategy.name().to_string(),
            expected: data.len(),
            got: signals.len(),
        });
    }

    let mut last_prices = PriceMap::new();
    let mut snapshots = Vec::with_capacity(data.date_spans().len());

    for span in data.date_spans() {
        let day_signals = signals.span(span.rows.clone());
        for signal in day_signals.iter().filter(|s| s.price.is_finite()) {
            last_prices.insert(signal.symbol.clone(), signal.price);
        }

        let mut executed = Vec::new();
        if risk_manager.check_limits(portfolio, day_signals) {
            let trades = build_day_trades(day_signals, portfolio.cash());
            for trade in &trades {
                executed.push(portfolio.execute_trade(trade)?);
            }
        } else {
            logger.debug(format_args!("{}: no trades, risk gate closed", span.date));
        }

        snapshots.push(DailySnapshot {
            date: span.date,
            portfolio_value: portfolio.total_value(&last_prices),
            cash: portfolio.cash(),
            positions: portfolio.positions_snapshot(),
            trades: executed,
        });
    }

    Ok(snapshots)
}
