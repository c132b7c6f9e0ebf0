//! rsitrader: RSI mean-reversion backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

/// Diagnostics go to stderr so stdout carries only the journal and summary.
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
}
