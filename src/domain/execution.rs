//! Fill simulation and commission.
//!
//! Buys debit cost plus commission from cash and open or extend the running
//! trade. Sells are long-only: they can reduce or close the held position but
//! never open a short.

use chrono::NaiveDate;

use super::order::OrderExecution;
use super::portfolio::Portfolio;
use super::position::{Position, Trade};

/// Commission parameters for the simulated broker.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of traded value, 0.001 = 0.1%.
    pub commission: f64,
    pub commission_per_trade: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission: 0.0,
            commission_per_trade: 0.0,
        }
    }
}

/// Calculate commission: |size| * price * rate + flat fee.
pub fn calculate_commission(size: i64, price: f64, config: &ExecutionConfig) -> f64 {
    size.unsigned_abs() as f64 * price * config.commission + config.commission_per_trade
}

/// Outcome of trying to fill a market order.
#[derive(Debug, Clone, PartialEq)]
pub enum FillResult {
    Filled {
        execution: OrderExecution,
        /// Snapshot of the trade after this fill.
        trade: Trade,
    },
    Margin,
    Rejected,
}

/// Buy `size` units at `price`.
///
/// 1. Reject non-positive sizes
/// 2. Margin if cost + commission exceeds cash
/// 3. Debit cash, open or extend the position
/// 4. Open a trade (id = order id) or add to the running one
pub fn fill_buy(
    portfolio: &mut Portfolio,
    order_id: u64,
    size: i64,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> FillResult {
    if size <= 0 {
        return FillResult::Rejected;
    }

    let cost = size as f64 * price;
    let commission = calculate_commission(size, price, config);

    if cost + commission > portfolio.cash {
        return FillResult::Margin;
    }

    portfolio.cash -= cost + commission;

    match portfolio.position.as_mut() {
        Some(position) => position.increase(size, price),
        None => {
            portfolio.position = Some(Position {
                size,
                price,
                opened: date,
            })
        }
    }

    let trade = match portfolio.open_trade.as_mut() {
        Some(trade) => {
            trade.add_entry(size, price, commission);
            trade.clone()
        }
        None => {
            let trade = Trade::open(order_id, size, price, date, commission);
            portfolio.open_trade = Some(trade.clone());
            trade
        }
    };

    FillResult::Filled {
        execution: OrderExecution {
            date,
            price,
            size,
            value: cost,
            commission,
        },
        trade,
    }
}

/// Sell up to `size` units at `price`.
///
/// The fill is capped at the held size. Executed value is the cost basis of
/// the units sold. When the position reaches zero the trade is closed and
/// moved to `closed_trades`.
pub fn fill_sell(
    portfolio: &mut Portfolio,
    size: i64,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> FillResult {
    if size <= 0 {
        return FillResult::Rejected;
    }

    let Some(position) = portfolio.position.as_mut() else {
        return FillResult::Rejected;
    };

    let fill_size = size.min(position.size);
    let proceeds = fill_size as f64 * price;
    let commission = calculate_commission(fill_size, price, config);
    let cost_basis = fill_size as f64 * position.price;

    portfolio.cash += proceeds - commission;
    position.size -= fill_size;
    let flat = position.size == 0;
    if flat {
        portfolio.position = None;
    }

    let mut trade = match portfolio.open_trade.take() {
        Some(trade) => trade,
        // A position always has a running trade; rebuild one if it was lost.
        None => Trade::open(0, fill_size, cost_basis / fill_size as f64, date, 0.0),
    };
    trade.reduce(fill_size, price, commission);

    if flat {
        trade.close(date);
        portfolio.closed_trades.push(trade.clone());
    } else {
        portfolio.open_trade = Some(trade.clone());
    }

    FillResult::Filled {
        execution: OrderExecution {
            date,
            price,
            size: -fill_size,
            value: cost_basis,
            commission,
        },
        trade,
    }
}
