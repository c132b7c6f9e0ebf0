//! Core domain types and logic.

pub mod backtest;
pub mod broker;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod strategy;
