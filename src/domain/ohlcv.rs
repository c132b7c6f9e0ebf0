//! OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Scale the price fields by `factor` and volume by its inverse, so the
    /// traded value of the bar is unchanged.
    ///
    /// Used to back-adjust a bar with the ratio `adj_close / close`.
    pub fn scaled(&self, factor: f64) -> OhlcvBar {
        OhlcvBar {
            date: self.date,
            open: self.open * factor,
            high: self.high * factor,
            low: self.low * factor,
            close: self.close * factor,
            volume: if factor != 0.0 {
                self.volume / factor
            } else {
                self.volume
            },
        }
    }
}
