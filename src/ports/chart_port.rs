//! Chart output port.

use crate::domain::error::TraderError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::Order;
use crate::domain::portfolio::EquityPoint;
use std::path::Path;

/// Everything a chart of one run needs.
#[derive(Debug, Clone, Copy)]
pub struct ChartData<'a> {
    pub title: &'a str,
    pub bars: &'a [OhlcvBar],
    pub rsi: &'a IndicatorSeries,
    pub overbought: f64,
    pub oversold: f64,
    pub orders: &'a [Order],
    pub equity_curve: &'a [EquityPoint],
}

pub trait ChartPort {
    fn render(&self, data: &ChartData<'_>, output_path: &Path) -> Result<(), TraderError>;
}
