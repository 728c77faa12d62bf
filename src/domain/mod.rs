//! Core domain types and logic.

pub mod error;
pub mod logging;
pub mod history;
pub mod indicator;
pub mod indicator_helpers;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod risk;
pub mod metrics;
pub mod backtest;
pub mod factor;
pub mod factor_engine;
pub mod config_validation;
