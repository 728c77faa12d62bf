//! Domain error types.

use chrono::NaiveDate;

/// Ledger invariant violations raised by [`Portfolio::execute_trade`].
///
/// [`Portfolio::execute_trade`]: crate::domain::portfolio::Portfolio::execute_trade
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortfolioError {
    #[error("oversell of {symbol}: held {held}, requested {requested}")]
    Oversell {
        symbol: String,
        held: u64,
        requested: u64,
    },

    #[error("insufficient cash for {symbol}: need {required:.2}, have {available:.2}")]
    InsufficientCash {
        symbol: String,
        required: f64,
        available: f64,
    },

    #[error("invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },
}

/// Per-factor computation failure. Isolated by the factor engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactorError {
    #[error("factor {factor} requires column '{column}' which is absent")]
    MissingColumn { factor: String, column: String },

    #[error("factor {factor} has invalid window {window}")]
    InvalidWindow { factor: String, window: usize },

    #[error("factor {factor} failed: {reason}")]
    Computation { factor: String, reason: String },
}

/// Top-level error type for quantstock.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("backtest data has not been set")]
    MissingData,

    #[error("backtest strategy has not been set")]
    MissingStrategy,

    #[error("strategy {strategy} produced {got} signals for {expected} history rows")]
    StrategyOutput {
        strategy: String,
        expected: usize,
        got: usize,
    },

    #[error("no backtest results; run the backtest first")]
    NoResults,

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error("failed to load data: {reason}")]
    DataLoad { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("duplicate row for {symbol} on {date}")]
    DuplicateRow { symbol: String, date: NaiveDate },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) | QuantError::Csv(_) | QuantError::Json(_) => 1,
            QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. }
            | QuantError::MissingData
            | QuantError::MissingStrategy
            | QuantError::StrategyOutput { .. } => 2,
            QuantError::DataLoad { .. }
            | QuantError::NoData { .. }
            | QuantError::DuplicateRow { .. } => 3,
            QuantError::Portfolio(_) => 4,
            QuantError::NoResults => 5,
        };
        std::process::ExitCode::from(code)
    }
}
