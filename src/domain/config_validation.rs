//! Configuration validation.
//!
//! Checks every field before a run so that bad values surface as config
//! errors rather than odd backtest results. Absent keys fall back to their
//! defaults and are therefore valid.

use crate::domain::backtest::{DEFAULT_COMMISSION, DEFAULT_INITIAL_CAPITAL, DEFAULT_STAKE};
use crate::domain::error::TraderError;
use crate::domain::strategy::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD, DEFAULT_RSI_PERIOD};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_stake(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_rsi_period(config)?;
    validate_thresholds(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if value <= 0.0 {
        return Err(TraderError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let rate = config.get_double("backtest", "commission", DEFAULT_COMMISSION);
    if rate < 0.0 || rate >= 1.0 {
        return Err(TraderError::invalid(
            "backtest",
            "commission",
            "commission must be a fraction between 0 and 1",
        ));
    }
    let per_trade = config.get_double("backtest", "commission_per_trade", 0.0);
    if per_trade < 0.0 {
        return Err(TraderError::invalid(
            "backtest",
            "commission_per_trade",
            "commission_per_trade must be non-negative",
        ));
    }
    Ok(())
}

fn validate_stake(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if config.get_int("backtest", "stake", DEFAULT_STAKE) < 1 {
        return Err(TraderError::invalid(
            "backtest",
            "stake",
            "stake must be at least 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(TraderError::invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Parse `[backtest] <key>` as YYYY-MM-DD. Missing or blank is `None`.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TraderError> {
    match config.get_string("backtest", key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                TraderError::invalid(
                    "backtest",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
        _ => Ok(None),
    }
}

fn validate_rsi_period(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let period = config.get_int("strategy", "rsi_period", DEFAULT_RSI_PERIOD as i64);
    if period < 1 {
        return Err(TraderError::invalid(
            "strategy",
            "rsi_period",
            "rsi_period must be at least 1",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let overbought = config.get_double("strategy", "overbought", DEFAULT_OVERBOUGHT);
    let oversold = config.get_double("strategy", "oversold", DEFAULT_OVERSOLD);

    for (key, value) in [("overbought", overbought), ("oversold", oversold)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(TraderError::invalid(
                "strategy",
                key,
                format!("{} must be between 0 and 100", key),
            ));
        }
    }

    if oversold >= overbought {
        return Err(TraderError::invalid(
            "strategy",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(ini: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(ini).unwrap()
    }

    fn assert_invalid_key(result: Result<(), TraderError>, expected: &str) {
        match result {
            Err(TraderError::ConfigInvalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn empty_config_is_valid() {
        let c = config("[backtest]\n");
        assert!(validate_backtest_config(&c).is_ok());
        assert!(validate_strategy_config(&c).is_ok());
    }

    #[test]
    fn full_config_is_valid() {
        let c = config(
            "[backtest]\n\
             start_date = 2019-08-16\n\
             end_date = 2024-08-16\n\
             initial_capital = 10000\n\
             commission = 0.001\n\
             stake = 5\n\
             [strategy]\n\
             rsi_period = 14\n\
             overbought = 70\n\
             oversold = 30\n",
        );
        assert!(validate_backtest_config(&c).is_ok());
        assert!(validate_strategy_config(&c).is_ok());
    }

    #[test]
    fn rejects_non_positive_capital() {
        let c = config("[backtest]\ninitial_capital = 0\n");
        assert_invalid_key(validate_backtest_config(&c), "initial_capital");
    }

    #[test]
    fn rejects_negative_commission() {
        let c = config("[backtest]\ncommission = -0.1\n");
        assert_invalid_key(validate_backtest_config(&c), "commission");

        let c = config("[backtest]\ncommission_per_trade = -1\n");
        assert_invalid_key(validate_backtest_config(&c), "commission_per_trade");
    }

    #[test]
    fn rejects_percentage_style_commission() {
        let c = config("[backtest]\ncommission = 10\n");
        assert_invalid_key(validate_backtest_config(&c), "commission");
    }

    #[test]
    fn rejects_zero_stake() {
        let c = config("[backtest]\nstake = 0\n");
        assert_invalid_key(validate_backtest_config(&c), "stake");
    }

    #[test]
    fn rejects_bad_date_format() {
        let c = config("[backtest]\nstart_date = 16/08/2019\n");
        assert_invalid_key(validate_backtest_config(&c), "start_date");
    }

    #[test]
    fn rejects_inverted_dates() {
        let c = config("[backtest]\nstart_date = 2024-01-02\nend_date = 2024-01-01\n");
        assert_invalid_key(validate_backtest_config(&c), "start_date");
    }

    #[test]
    fn same_start_and_end_is_valid() {
        let c = config("[backtest]\nstart_date = 2024-01-01\nend_date = 2024-01-01\n");
        assert!(validate_backtest_config(&c).is_ok());
    }

    #[test]
    fn parse_optional_date_blank_is_none() {
        let c = config("[backtest]\nstart_date =\n");
        assert_eq!(parse_optional_date(&c, "start_date").unwrap(), None);
        assert_eq!(parse_optional_date(&c, "end_date").unwrap(), None);
    }

    #[test]
    fn rejects_zero_rsi_period() {
        let c = config("[strategy]\nrsi_period = 0\n");
        assert_invalid_key(validate_strategy_config(&c), "rsi_period");
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let c = config("[strategy]\noverbought = 120\n");
        assert_invalid_key(validate_strategy_config(&c), "overbought");
    }

    #[test]
    fn rejects_crossed_thresholds() {
        let c = config("[strategy]\noverbought = 40\noversold = 60\n");
        assert_invalid_key(validate_strategy_config(&c), "oversold");
    }
}
