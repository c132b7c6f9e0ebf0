//! Long position and round-trip trade tracking.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub size: i64,
    /// Average entry price.
    pub price: f64,
    pub opened: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size as f64 * (price - self.price)
    }

    /// Add `size` units bought at `price`, re-averaging the entry price.
    pub fn increase(&mut self, size: i64, price: f64) {
        let total = self.size + size;
        self.price = (self.price * self.size as f64 + price * size as f64) / total as f64;
        self.size = total;
    }
}

/// One round-trip, opened by a buy and closed when the position returns to
/// zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: u64,
    pub size: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub exit_price: f64,
    pub exit_date: Option<NaiveDate>,
    /// Gross profit, before commission.
    pub pnl: f64,
    /// Net profit, after entry and exit commission.
    pub pnl_comm: f64,
    pub commission: f64,
}

impl Trade {
    pub fn open(id: u64, size: i64, price: f64, date: NaiveDate, commission: f64) -> Self {
        Trade {
            id,
            size,
            entry_price: price,
            entry_date: date,
            exit_price: 0.0,
            exit_date: None,
            pnl: 0.0,
            pnl_comm: 0.0,
            commission,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit_date.is_some()
    }

    /// Add units bought while the trade is open.
    pub fn add_entry(&mut self, size: i64, price: f64, commission: f64) {
        let total = self.size + size;
        self.entry_price =
            (self.entry_price * self.size as f64 + price * size as f64) / total as f64;
        self.size = total;
        self.commission += commission;
    }

    /// Realise `size` units sold at `price`.
    pub fn reduce(&mut self, size: i64, price: f64, commission: f64) {
        self.pnl += size as f64 * (price - self.entry_price);
        self.commission += commission;
        self.pnl_comm = self.pnl - self.commission;
        self.exit_price = price;
    }

    pub fn close(&mut self, date: NaiveDate) {
        self.exit_date = Some(date);
    }

    /// Days held, zero while the trade is open.
    pub fn duration_days(&self) -> i64 {
        self.exit_date
            .map(|exit| (exit - self.entry_date).num_days())
            .unwrap_or(0)
    }
}
