//! Price data access port.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars within the inclusive range, sorted by date. `None` leaves that
    /// side of the range open. An empty selection is `TraderError::NoData`.
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TraderError>;

    /// First date, last date and bar count of the whole source.
    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TraderError>;
}
