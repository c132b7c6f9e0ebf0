//! Strategy seam and the RSI mean-reversion strategy.
//!
//! The engine calls [`Strategy::next`] once per bar after warm-up and relays
//! broker events through `notify_order` / `notify_trade`. Sizing is the
//! engine's job: a buy uses the configured stake, a sell closes the position.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::position::Trade;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
}

/// Read-only view of the current bar handed to the strategy.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub index: usize,
    pub bar: &'a OhlcvBar,
    pub has_position: bool,
    pub cash: f64,
}

pub trait Strategy {
    fn name(&self) -> &str;

    /// Precompute indicators over the full bar series.
    fn init(&mut self, bars: &[OhlcvBar]);

    /// Number of leading bars during which `next` is not called.
    fn warmup(&self) -> usize;

    fn next(&mut self, ctx: &BarContext<'_>) -> Option<Signal>;

    fn notify_order(&mut self, _order: &Order, _date: NaiveDate) {}

    fn notify_trade(&mut self, _trade: &Trade, _date: NaiveDate) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiParams {
    pub rsi_period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            rsi_period: DEFAULT_RSI_PERIOD,
            overbought: DEFAULT_OVERBOUGHT,
            oversold: DEFAULT_OVERSOLD,
        }
    }
}

/// The threshold rule. Buy when oversold and flat, sell when overbought and
/// long, otherwise nothing.
pub fn evaluate(rsi: f64, has_position: bool, params: &RsiParams) -> Option<Signal> {
    if rsi < params.oversold {
        (!has_position).then_some(Signal::Buy)
    } else if rsi > params.overbought {
        has_position.then_some(Signal::Sell)
    } else {
        None
    }
}

/// A dated line in the strategy's journal.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub date: NaiveDate,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.date.format("%Y-%m-%d"), self.message)
    }
}

#[derive(Debug, Clone)]
pub struct RsiStrategy {
    params: RsiParams,
    rsi: IndicatorSeries,
    journal: Vec<LogLine>,
}

impl RsiStrategy {
    pub fn new(params: RsiParams) -> Self {
        let rsi = IndicatorSeries {
            label: crate::domain::indicator::rsi::label(params.rsi_period),
            values: Vec::new(),
        };
        RsiStrategy {
            params,
            rsi,
            journal: Vec::new(),
        }
    }

    pub fn params(&self) -> &RsiParams {
        &self.params
    }

    pub fn rsi(&self) -> &IndicatorSeries {
        &self.rsi
    }

    pub fn journal(&self) -> &[LogLine] {
        &self.journal
    }

    pub fn into_journal(self) -> Vec<LogLine> {
        self.journal
    }

    fn log(&mut self, date: NaiveDate, message: String) {
        self.journal.push(LogLine { date, message });
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "RSI mean reversion"
    }

    fn init(&mut self, bars: &[OhlcvBar]) {
        self.rsi = calculate_rsi(bars, self.params.rsi_period);
    }

    fn warmup(&self) -> usize {
        self.params.rsi_period
    }

    fn next(&mut self, ctx: &BarContext<'_>) -> Option<Signal> {
        let rsi = self.rsi.value_at(ctx.index)?;
        let signal = evaluate(rsi, ctx.has_position, &self.params)?;

        let action = match signal {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
        };
        self.log(
            ctx.bar.date,
            format!(
                "{} ORDER CREATED, Price: {:.2}, RSI: {:.2}",
                action, ctx.bar.close, rsi
            ),
        );
        Some(signal)
    }

    fn notify_order(&mut self, order: &Order, date: NaiveDate) {
        match order.status {
            OrderStatus::Submitted | OrderStatus::Accepted => {}
            OrderStatus::Completed => {
                if let Some(exec) = &order.executed {
                    let action = if order.is_buy() { "BUY" } else { "SELL" };
                    self.log(
                        date,
                        format!(
                            "{} EXECUTED, Price: {:.2}, Cost: {:.2}",
                            action, exec.price, exec.value
                        ),
                    );
                }
            }
            OrderStatus::Canceled | OrderStatus::Margin | OrderStatus::Rejected => {
                self.log(date, "Order Canceled/Margin/Rejected".to_string());
            }
        }
    }

    fn notify_trade(&mut self, trade: &Trade, date: NaiveDate) {
        if !trade.is_closed() {
            return;
        }
        self.log(
            date,
            format!(
                "TRADE PROFIT, Gross: {:.2}, Net: {:.2}",
                trade.pnl, trade.pnl_comm
            ),
        );
    }
}
