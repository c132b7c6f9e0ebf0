//! Market orders and their lifecycle.
//!
//! An order is created Submitted, moves to Accepted as soon as the broker
//! books it, and ends in one of the terminal states once the next bar is
//! processed.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Margin,
    Rejected,
}

impl OrderStatus {
    /// Submitted and Accepted orders can still fill.
    pub fn is_alive(self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::Margin => "Margin",
            OrderStatus::Rejected => "Rejected",
        };
        f.write_str(name)
    }
}

/// Fill details, present once an order completes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExecution {
    pub date: NaiveDate,
    pub price: f64,
    pub size: i64,
    /// Buy: size * price. Sell: cost basis of the units closed.
    pub value: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: u64,
    pub side: OrderSide,
    pub size: i64,
    pub created: NaiveDate,
    pub status: OrderStatus,
    pub executed: Option<OrderExecution>,
}

impl Order {
    pub fn market(id: u64, side: OrderSide, size: i64, created: NaiveDate) -> Self {
        Order {
            id,
            side,
            size,
            created,
            status: OrderStatus::Submitted,
            executed: None,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }

    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn market_order_starts_submitted() {
        let order = Order::market(1, OrderSide::Buy, 10, date());
        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(order.executed.is_none());
        assert!(order.is_buy());
        assert!(!order.is_sell());
        assert!(order.is_alive());
    }

    #[test]
    fn terminal_statuses_are_not_alive() {
        assert!(OrderStatus::Accepted.is_alive());
        for status in [
            OrderStatus::Completed,
            OrderStatus::Canceled,
            OrderStatus::Margin,
            OrderStatus::Rejected,
        ] {
            assert!(!status.is_alive(), "{} should be terminal", status);
        }
    }

    #[test]
    fn status_display() {
        assert_eq!(OrderStatus::Margin.to_string(), "Margin");
        assert_eq!(OrderStatus::Canceled.to_string(), "Canceled");
    }
}
