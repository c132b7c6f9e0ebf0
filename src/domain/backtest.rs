//! Backtest engine and event loop.
//!
//! Per bar: fill pending orders at the open, deliver broker notifications,
//! run the strategy once warmed up, then mark equity at the close. Orders
//! placed on the last bar never fill: they are returned Accepted and the
//! strategy is not notified.

use chrono::NaiveDate;
use log::{debug, info};

use crate::domain::broker::{Broker, Notification};
use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::Order;
use crate::domain::portfolio::Portfolio;
use crate::domain::strategy::{BarContext, Signal, Strategy};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_COMMISSION: f64 = 0.001;
pub const DEFAULT_STAKE: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Inclusive. `None` starts at the first bar in the file.
    pub start_date: Option<NaiveDate>,
    /// Inclusive. `None` runs to the last bar in the file.
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub commission: f64,
    pub commission_per_trade: f64,
    /// Units bought per buy signal.
    pub stake: i64,
    /// Annual rate used for the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            start_date: None,
            end_date: None,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission: DEFAULT_COMMISSION,
            commission_per_trade: 0.0,
            stake: DEFAULT_STAKE,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission: self.commission,
            commission_per_trade: self.commission_per_trade,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub orders: Vec<Order>,
    pub bars_processed: usize,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.portfolio.final_equity()
    }
}

pub fn run_backtest(
    bars: &[OhlcvBar],
    strategy: &mut dyn Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, TraderError> {
    let warmup = strategy.warmup();
    if bars.len() <= warmup {
        return Err(TraderError::InsufficientData {
            bars: bars.len(),
            minimum: warmup + 1,
        });
    }

    info!(
        "Running {}: {} bars, starting cash {:.2}",
        strategy.name(),
        bars.len(),
        config.initial_capital
    );

    strategy.init(bars);
    let mut broker = Broker::new(config.initial_capital, config.execution_config());

    for (index, bar) in bars.iter().enumerate() {
        broker.process_bar(bar);
        deliver(&mut broker, strategy, bar.date);

        if index >= warmup {
            let ctx = BarContext {
                index,
                bar,
                has_position: broker.position().is_some(),
                cash: broker.cash(),
            };
            match strategy.next(&ctx) {
                Some(Signal::Buy) => {
                    broker.buy(config.stake, bar.date);
                }
                Some(Signal::Sell) => {
                    let size = broker.position().map(|p| p.size).unwrap_or(config.stake);
                    broker.sell(size, bar.date);
                }
                None => {}
            }
        }

        broker.record_equity(bar.date, bar.close);
    }

    if !broker.pending().is_empty() {
        debug!("{} orders still accepted at end of data", broker.pending().len());
    }
    let (portfolio, orders) = broker.finish();
    for trade in &portfolio.closed_trades {
        debug!(
            "trade {}: {} units held {} days, net {:.2}",
            trade.id,
            trade.size,
            trade.duration_days(),
            trade.pnl_comm
        );
    }
    if let (Some(position), Some(last)) = (&portfolio.position, bars.last()) {
        info!(
            "Position of {} still open, unrealized {:.2}",
            position.size,
            position.unrealized_pnl(last.close)
        );
    }
    info!(
        "Finished: {} orders, {} closed trades, final value {:.2}",
        orders.len(),
        portfolio.closed_trades.len(),
        portfolio.final_equity()
    );

    Ok(BacktestResult {
        portfolio,
        orders,
        bars_processed: bars.len(),
    })
}

fn deliver(broker: &mut Broker, strategy: &mut dyn Strategy, date: NaiveDate) {
    for notification in broker.take_notifications() {
        match notification {
            Notification::Order(order) => strategy.notify_order(&order, date),
            Notification::Trade(trade) => strategy.notify_trade(&trade, date),
        }
    }
}
