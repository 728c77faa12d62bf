//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvHistoryAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_factor_config, validate_risk_config,
    validate_strategy_config,
};
use crate::domain::error::QuantError;
use crate::domain::factor::{DEFAULT_MOMENTUM_LOOKBACK, DEFAULT_VOLATILITY_WINDOW, FactorTable};
use crate::domain::factor_engine::{FactorConfig, FactorEngine};
use crate::domain::logging::Logger;
use crate::domain::portfolio::CommissionConfig;
use crate::domain::risk::RiskConfig;
use crate::domain::strategy::StrategySpec;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::HistoryPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "quantstock", about = "Factor research and signal backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        /// Directory for snapshots.csv, trades.csv and metrics.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute factor columns
    Factors {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Directory for factors.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest(&config, &data, output.as_deref()),
        Command::Factors {
            config,
            data,
            output,
        } => run_factors(&config, &data, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data } => run_list_symbols(&data),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, QuantError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_backtest(config_path: &Path, data_dir: &Path, output: Option<&Path>) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let data = CsvHistoryAdapter::new(data_dir.to_path_buf());
    let report = CsvReportAdapter::new();

    let result = run_backtest_pipeline(
        &config,
        &data,
        output.map(|dir| (&report as &dyn ReportPort, dir)),
        &Logger::default(),
    )?;

    print_backtest_summary(&result);
    if let Some(dir) = output {
        eprintln!("Results written to {}", dir.display());
    }
    Ok(())
}

fn run_factors(config_path: &Path, data_dir: &Path, output: Option<&Path>) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let data = CsvHistoryAdapter::new(data_dir.to_path_buf());
    let report = CsvReportAdapter::new();

    let table = run_factor_pipeline(
        &config,
        &data,
        output.map(|dir| (&report as &dyn ReportPort, dir)),
        &Logger::default(),
    )?;

    println!(
        "{} rows, factors: {}",
        table.len(),
        table.factor_names().collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), QuantError> {
    let config = load_config(config_path)?;

    let backtest = build_backtest_config(&config)?;
    eprintln!(
        "Backtest: capital {:.2}, commission {} + {}",
        backtest.initial_capital, backtest.commission.per_trade, backtest.commission.rate
    );

    let spec = build_strategy_spec(&config)?;
    eprintln!("Strategy: {}", serde_json::to_string(&spec)?);

    if config.get_string("factors", "enabled").is_some() {
        let factors = build_factor_config(&config)?;
        eprintln!("Factors: {}", factors.enabled.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(data_dir: &Path) -> Result<(), QuantError> {
    let data = CsvHistoryAdapter::new(data_dir.to_path_buf());
    for symbol in data.list_symbols()? {
        println!("{symbol}");
    }
    Ok(())
}

fn print_backtest_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!("Strategy:      {}", result.strategy);
    for (name, value) in &result.parameters {
        println!("  {name:<12} {value}");
    }
    println!("Trading days:  {}", m.trading_days);
    println!("Total trades:  {}", m.total_trades);
    println!("Total return:  {:.4}", m.total_return);
    println!("Annual return: {:.4}", m.annual_return);
    println!("Max drawdown:  {:.4}", m.max_drawdown);
    println!("Sharpe ratio:  {:.4}", m.sharpe_ratio);
}

/// Load data, run the configured strategy and optionally write the reports.
pub fn run_backtest_pipeline(
    config: &dyn ConfigPort,
    data: &dyn HistoryPort,
    report: Option<(&dyn ReportPort, &Path)>,
    logger: &Logger,
) -> Result<BacktestResult, QuantError> {
    let backtest_config = build_backtest_config(config)?;
    let spec = build_strategy_spec(config)?;
    let symbols = resolve_symbols(config);

    let history = data.load_history(
        &symbols,
        backtest_config.start_date,
        backtest_config.end_date,
    )?;
    if history.is_empty() {
        return Err(QuantError::DataLoad {
            reason: "no rows in the configured date range".to_string(),
        });
    }

    let mut engine = BacktestEngine::new(backtest_config, logger.child("backtest"));
    engine.set_data(history);
    engine.set_strategy(spec.build());
    let result = engine.run_backtest()?.clone();

    if let Some((port, dir)) = report {
        port.write_backtest(&result, dir)?;
    }
    Ok(result)
}

/// Load data, compute the configured factors and optionally write them.
pub fn run_factor_pipeline(
    config: &dyn ConfigPort,
    data: &dyn HistoryPort,
    report: Option<(&dyn ReportPort, &Path)>,
    logger: &Logger,
) -> Result<FactorTable, QuantError> {
    validate_backtest_config(config)?;
    let factor_config = build_factor_config(config)?;
    let symbols = resolve_symbols(config);

    let history = data.load_history(
        &symbols,
        parse_date(config, "start_date")?,
        parse_date(config, "end_date")?,
    )?;

    let mut engine = FactorEngine::with_default_factors(&factor_config, logger.child("factors"));
    let table = engine.calculate_all_factors(&history).clone();

    if let Some((port, dir)) = report {
        port.write_factors(&table, dir)?;
    }
    Ok(table)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, QuantError> {
    validate_backtest_config(config)?;
    validate_risk_config(config)?;

    let defaults = RiskConfig::default();
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", 1_000_000.0),
        commission: CommissionConfig {
            per_trade: config.get_double("backtest", "commission_per_trade", 0.0),
            rate: config.get_double("backtest", "commission_rate", 0.0),
        },
        risk: RiskConfig {
            max_position_size: config.get_double(
                "risk",
                "max_position_size",
                defaults.max_position_size,
            ),
            stop_loss: config.get_double("risk", "stop_loss", defaults.stop_loss),
            take_profit: config.get_double("risk", "take_profit", defaults.take_profit),
        },
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
    })
}

pub fn build_strategy_spec(config: &dyn ConfigPort) -> Result<StrategySpec, QuantError> {
    validate_strategy_config(config)?;

    let kind = config.get_string("strategy", "type").unwrap_or_default();
    let spec = match kind.trim() {
        "rsi_threshold" => StrategySpec::RsiThreshold {
            window: get_window(config, "strategy", "window", 14),
            oversold: config.get_double("strategy", "oversold", 30.0),
            overbought: config.get_double("strategy", "overbought", 70.0),
        },
        _ => StrategySpec::MovingAverageCross {
            short_window: get_window(config, "strategy", "short_window", 20),
            long_window: get_window(config, "strategy", "long_window", 50),
        },
    };
    spec.validate()?;
    Ok(spec)
}

/// An absent or empty `enabled` list selects every built-in factor.
pub fn build_factor_config(config: &dyn ConfigPort) -> Result<FactorConfig, QuantError> {
    validate_factor_config(config)?;

    let defaults = FactorConfig::default();
    let enabled = config.get_list("factors", "enabled");
    Ok(FactorConfig {
        enabled: if enabled.is_empty() {
            defaults.enabled
        } else {
            enabled
        },
        momentum_lookback: get_window(
            config,
            "factors",
            "momentum_lookback",
            DEFAULT_MOMENTUM_LOOKBACK,
        ),
        volatility_window: get_window(
            config,
            "factors",
            "volatility_window",
            DEFAULT_VOLATILITY_WINDOW,
        ),
        parallel: config.get_bool("factors", "parallel", false),
    })
}

/// `[backtest] symbols`; empty means every symbol the data source has.
pub fn resolve_symbols(config: &dyn ConfigPort) -> Vec<String> {
    config.get_list("backtest", "symbols")
}

fn get_window(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}
