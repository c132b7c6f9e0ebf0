//! Simulated broker: order book, fills at the next bar's open, and the
//! notification queue drained by the event loop.

use chrono::NaiveDate;
use log::debug;
use std::mem;

use super::execution::{fill_buy, fill_sell, ExecutionConfig, FillResult};
use super::ohlcv::OhlcvBar;
use super::order::{Order, OrderSide, OrderStatus};
use super::portfolio::Portfolio;
use super::position::{Position, Trade};

/// Event delivered to the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Order(Order),
    Trade(Trade),
}

#[derive(Debug)]
pub struct Broker {
    portfolio: Portfolio,
    config: ExecutionConfig,
    pending: Vec<Order>,
    history: Vec<Order>,
    notifications: Vec<Notification>,
    next_id: u64,
}

impl Broker {
    pub fn new(initial_capital: f64, config: ExecutionConfig) -> Self {
        Broker {
            portfolio: Portfolio::new(initial_capital),
            config,
            pending: Vec::new(),
            history: Vec::new(),
            notifications: Vec::new(),
            next_id: 1,
        }
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash
    }

    /// Cash plus the held position marked at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.portfolio.value(price)
    }

    pub fn position(&self) -> Option<&Position> {
        self.portfolio.position.as_ref()
    }

    pub fn pending(&self) -> &[Order] {
        &self.pending
    }

    /// Book a market order. Returns its id.
    ///
    /// The order is notified as Submitted and then Accepted; it fills when
    /// the next bar is processed.
    pub fn submit(&mut self, side: OrderSide, size: i64, date: NaiveDate) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let mut order = Order::market(id, side, size, date);
        self.notifications.push(Notification::Order(order.clone()));
        order.status = OrderStatus::Accepted;
        self.notifications.push(Notification::Order(order.clone()));

        debug!("order {} accepted: {:?} {} on {}", id, side, size, date);
        self.pending.push(order);
        id
    }

    pub fn buy(&mut self, size: i64, date: NaiveDate) -> u64 {
        self.submit(OrderSide::Buy, size, date)
    }

    pub fn sell(&mut self, size: i64, date: NaiveDate) -> u64 {
        self.submit(OrderSide::Sell, size, date)
    }

    /// Fill every pending order at `bar.open`, in submission order.
    pub fn process_bar(&mut self, bar: &OhlcvBar) {
        for mut order in mem::take(&mut self.pending) {
            let result = match order.side {
                OrderSide::Buy => fill_buy(
                    &mut self.portfolio,
                    order.id,
                    order.size,
                    bar.open,
                    bar.date,
                    &self.config,
                ),
                OrderSide::Sell => {
                    fill_sell(&mut self.portfolio, order.size, bar.open, bar.date, &self.config)
                }
            };

            let trade = match result {
                FillResult::Filled { execution, trade } => {
                    order.status = OrderStatus::Completed;
                    order.executed = Some(execution);
                    Some(trade)
                }
                FillResult::Margin => {
                    order.status = OrderStatus::Margin;
                    None
                }
                FillResult::Rejected => {
                    order.status = OrderStatus::Rejected;
                    None
                }
            };

            debug!("order {} {} on {}", order.id, order.status, bar.date);
            self.notifications.push(Notification::Order(order.clone()));
            if let Some(trade) = trade {
                self.notifications.push(Notification::Trade(trade));
            }
            self.history.push(order);
        }
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.notifications)
    }

    /// Mark the book at `close` and append to the equity curve.
    pub fn record_equity(&mut self, date: NaiveDate, close: f64) {
        let equity = self.value(close);
        self.portfolio.record_equity(date, equity);
    }

    /// Consume the broker, returning the final portfolio and every order that
    /// reached a terminal state, followed by any still pending.
    pub fn finish(self) -> (Portfolio, Vec<Order>) {
        let mut orders = self.history;
        orders.extend(self.pending);
        (self.portfolio, orders)
    }
}
