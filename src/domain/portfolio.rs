//! Cash, position and equity tracking.

use chrono::NaiveDate;

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub open_trade: Option<Trade>,
    pub closed_trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            open_trade: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Units currently held, zero when flat.
    pub fn position_size(&self) -> i64 {
        self.position.as_ref().map(|p| p.size).unwrap_or(0)
    }

    /// Cash plus the position marked at `price`.
    pub fn value(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|p| p.market_value(price))
            .unwrap_or(0.0);
        self.cash + position_value
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.cash - 10_000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert!(!portfolio.has_position());
        assert_eq!(portfolio.position_size(), 0);
        assert!(portfolio.closed_trades.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn value_without_position_is_cash() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.value(123.0) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn value_marks_position_at_price() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.cash = 9_000.0;
        portfolio.position = Some(Position {
            size: 10,
            price: 100.0,
            opened: date(),
        });

        assert_eq!(portfolio.position_size(), 10);
        assert!((portfolio.value(110.0) - 10_100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_equity_and_final() {
        let mut portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.final_equity() - 10_000.0).abs() < f64::EPSILON);

        portfolio.record_equity(date(), 10_500.0);
        assert_eq!(portfolio.equity_curve.len(), 1);
        assert_eq!(portfolio.equity_curve[0].date, date());
        assert!((portfolio.final_equity() - 10_500.0).abs() < f64::EPSILON);
    }
}
