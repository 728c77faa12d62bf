//! Configuration validation.
//!
//! Validates all config fields before a backtest or factor run. Every
//! check reads through [`ConfigPort`] so the rules are independent of the
//! file format.

use crate::domain::error::QuantError;
use crate::domain::factor::BUILTIN_FACTORS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_TYPES: [&str; 2] = ["moving_average_cross", "rsi_threshold"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_fraction(config, "max_position_size", 0.0, 1.0)?;
    validate_fraction(config, "stop_loss", 0.0, 1.0)?;
    validate_fraction(config, "take_profit", 0.0, f64::INFINITY)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let kind = validate_strategy_type(config)?;
    let windows: &[&str] = match kind.as_str() {
        "moving_average_cross" => &["short_window", "long_window"],
        _ => &["window"],
    };
    for key in windows {
        validate_window(config, "strategy", key)?;
    }
    if kind == "rsi_threshold" {
        read_number(config, "strategy", "oversold", 0.0)?;
        read_number(config, "strategy", "overbought", 0.0)?;
    }
    Ok(())
}

pub fn validate_factor_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    for name in config.get_list("factors", "enabled") {
        if !BUILTIN_FACTORS.contains(&name.as_str()) {
            return Err(QuantError::ConfigInvalid {
                section: "factors".to_string(),
                key: "enabled".to_string(),
                reason: format!("unknown factor '{name}'"),
            });
        }
    }
    validate_window(config, "factors", "momentum_lookback")?;
    validate_window(config, "factors", "volatility_window")?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let value = read_number(config, "backtest", "initial_capital", 1_000_000.0)?;
    if value <= 0.0 || !value.is_finite() {
        return Err(QuantError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), QuantError> {
    for key in ["commission_per_trade", "commission_rate"] {
        if read_number(config, "backtest", key, 0.0)? < 0.0 {
            return Err(QuantError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be non-negative"),
            });
        }
    }
    Ok(())
}

/// Both dates are optional; when both are given, start must not follow end.
fn validate_dates(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(QuantError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

/// `[backtest] <field>` as a date, `None` when absent or blank.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, QuantError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| QuantError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let Some(raw) = config.get_string("backtest", "symbols") else {
        return Ok(());
    };
    if raw.split(',').any(|s| s.trim().is_empty()) && !raw.trim().is_empty() {
        return Err(QuantError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
            reason: "symbols must not contain empty entries".to_string(),
        });
    }
    Ok(())
}

fn validate_fraction(config: &dyn ConfigPort, key: &str, min: f64, max: f64) -> Result<(), QuantError> {
    let value = read_number(config, "risk", key, 0.0)?;
    if value < min || value > max || value.is_nan() {
        return Err(QuantError::ConfigInvalid {
            section: "risk".to_string(),
            key: key.to_string(),
            reason: if max.is_finite() {
                format!("{key} must be between {min} and {max}")
            } else {
                format!("{key} must be non-negative")
            },
        });
    }
    Ok(())
}

fn validate_strategy_type(config: &dyn ConfigPort) -> Result<String, QuantError> {
    match config.get_string("strategy", "type") {
        Some(s) if STRATEGY_TYPES.contains(&s.trim()) => Ok(s.trim().to_string()),
        Some(s) if !s.trim().is_empty() => Err(QuantError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "type".to_string(),
            reason: format!(
                "unknown strategy '{}', expected one of: {}",
                s.trim(),
                STRATEGY_TYPES.join(", ")
            ),
        }),
        _ => Err(QuantError::ConfigMissing {
            section: "strategy".to_string(),
            key: "type".to_string(),
        }),
    }
}

/// The value of a numeric key, or `default` when it is absent or blank.
/// A present value must parse as a number.
fn read_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| QuantError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a number, got '{}'", raw.trim()),
        }),
    }
}

/// Absent keys take their defaults later; present ones must be positive
/// integers.
fn validate_window(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), QuantError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(()),
        _ => Err(QuantError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a positive integer"),
        }),
    }
}
