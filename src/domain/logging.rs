//! Explicit logging handle injected into domain components.
//!
//! Components never log through an implicit module target; each one is
//! constructed with a `Logger` naming its target. The process-wide sink
//! (`env_logger`) is installed by the binary only.

use log::Level;
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    target: Cow<'static, str>,
    enabled: bool,
}

impl Logger {
    pub fn new(target: impl Into<Cow<'static, str>>) -> Self {
        Self {
            target: target.into(),
            enabled: true,
        }
    }

    /// A handle that drops every record.
    pub fn silent() -> Self {
        Self {
            target: Cow::Borrowed("quantstock"),
            enabled: false,
        }
    }

    /// Derive a handle for a sub-component, e.g. `quantstock::backtest::risk`.
    pub fn child(&self, name: &str) -> Self {
        Self {
            target: Cow::Owned(format!("{}::{}", self.target, name)),
            enabled: self.enabled,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled {
            log::log!(target: self.target.as_ref(), level, "{}", args);
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new("quantstock")
    }
}
