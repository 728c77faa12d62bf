//! Factor registry and batch evaluator.
//!
//! A failing factor is logged and its column omitted; the batch itself
//! always succeeds. Columns are independent, so evaluation may fan out over
//! rayon's pool. Results are merged in name order either way.

use rayon::prelude::*;
use std::collections::BTreeMap;

use super::error::FactorError;
use super::factor::{
    BUILTIN_FACTORS, DEFAULT_MOMENTUM_LOOKBACK, DEFAULT_VOLATILITY_WINDOW, Factor, FactorTable,
    GrowthFactor, LiquidityFactor, MomentumFactor, QualityFactor, SizeFactor, ValueFactor,
    VolatilityFactor,
};
use super::history::HistoryTable;
use super::logging::Logger;

#[derive(Debug, Clone, PartialEq)]
pub struct FactorConfig {
    /// Built-in factor names to register.
    pub enabled: Vec<String>,
    pub momentum_lookback: usize,
    pub volatility_window: usize,
    pub parallel: bool,
}

impl Default for FactorConfig {
    fn default() -> Self {
        FactorConfig {
            enabled: BUILTIN_FACTORS.iter().map(|s| s.to_string()).collect(),
            momentum_lookback: DEFAULT_MOMENTUM_LOOKBACK,
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
            parallel: false,
        }
    }
}

/// Construct a built-in factor by name.
pub fn builtin_factor(name: &str, config: &FactorConfig) -> Option<Box<dyn Factor>> {
    let factor: Box<dyn Factor> = match name {
        "value_factor" => Box::new(ValueFactor),
        "momentum_factor" => Box::new(MomentumFactor {
            lookback: config.momentum_lookback,
        }),
        "quality_factor" => Box::new(QualityFactor),
        "size_factor" => Box::new(SizeFactor),
        "volatility_factor" => Box::new(VolatilityFactor {
            window: config.volatility_window,
        }),
        "liquidity_factor" => Box::new(LiquidityFactor),
        "growth_factor" => Box::new(GrowthFactor),
        _ => return None,
    };
    Some(factor)
}

#[derive(Debug)]
pub struct FactorEngine {
    factors: BTreeMap<String, Box<dyn Factor>>,
    parallel: bool,
    last_table: Option<FactorTable>,
    logger: Logger,
}

impl FactorEngine {
    pub fn new(logger: Logger) -> Self {
        FactorEngine {
            factors: BTreeMap::new(),
            parallel: false,
            last_table: None,
            logger,
        }
    }

    /// Engine with every built-in factor named in `config.enabled`.
    pub fn with_default_factors(config: &FactorConfig, logger: Logger) -> Self {
        let mut engine = FactorEngine::new(logger);
        engine.parallel = config.parallel;
        for name in &config.enabled {
            match builtin_factor(name, config) {
                Some(factor) => engine.register(factor),
                None => engine
                    .logger
                    .warn(format_args!("unknown factor '{name}' ignored")),
            }
        }
        engine
    }

    /// Register `factor` under its name, replacing any existing entry.
    pub fn register(&mut self, factor: Box<dyn Factor>) {
        let name = factor.name().to_string();
        if self.factors.insert(name.clone(), factor).is_some() {
            self.logger
                .debug(format_args!("factor {name} re-registered"));
        }
    }

    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.keys().map(String::as_str).collect()
    }

    /// Evaluate every registered factor over `history` and cache the table.
    pub fn calculate_all_factors(&mut self, history: &HistoryTable) -> &FactorTable {
        let entries: Vec<(&String, &Box<dyn Factor>)> = self.factors.iter().collect();

        let computed: Vec<(&String, Result<Vec<f64>, FactorError>)> = if self.parallel {
            entries
                .par_iter()
                .map(|(name, factor)| (*name, factor.calculate(history)))
                .collect()
        } else {
            entries
                .iter()
                .map(|(name, factor)| (*name, factor.calculate(history)))
                .collect()
        };

        let mut table = FactorTable::new(history);
        for (name, result) in computed {
            match result {
                Ok(values) => {
                    if !table.insert(name, values) {
                        self.logger.error(format_args!(
                            "factor {name} returned a misaligned series; skipped"
                        ));
                    }
                }
                Err(err) => self.logger.error(format_args!("{err}; skipped")),
            }
        }

        self.logger.info(format_args!(
            "computed {} of {} factors over {} rows",
            table.column_count(),
            self.factors.len(),
            table.len()
        ));

        self.last_table.insert(table)
    }

    /// Column `name` from the last computed table.
    pub fn get_factor_data(&self, name: &str) -> Option<&[f64]> {
        self.last_table.as_ref()?.column(name)
    }

    pub fn last_table(&self) -> Option<&FactorTable> {
        self.last_table.as_ref()
    }
}
