//! CSV price file adapter.
//!
//! Reads Yahoo Finance style exports:
//! `Date,Open,High,Low,Close,Adj Close,Volume`. Columns are looked up by
//! header name, so order does not matter and `Adj Close` / `Volume` may be
//! absent. Rows with `null` prices (market holidays) are skipped.

use crate::domain::config_validation::DATE_FORMAT;
use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use log::{debug, warn};
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    path: PathBuf,
    adjust_close: bool,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, TraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| TraderError::DataParse {
                line: 1,
                reason: format!("missing {} column", name),
            })
        };

        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            adj_close: find("adj close").or_else(|| find("adj_close")),
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            adjust_close: true,
        }
    }

    /// Scale OHLC by `adj_close / close`, and volume by its inverse, when an
    /// adjusted close is present.
    pub fn with_adjust_close(mut self, adjust_close: bool) -> Self {
        self.adjust_close = adjust_close;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<OhlcvBar>, TraderError> {
        let file = File::open(&self.path).map_err(|e| TraderError::DataRead {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = rdr
            .headers()
            .map_err(|e| TraderError::DataRead {
                path: self.path.clone(),
                reason: e.to_string(),
            })?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| TraderError::DataParse {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            match self.parse_record(&record, &columns, line)? {
                Some(bar) => bars.push(bar),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("skipped {} rows with missing prices in {}", skipped, self.path.display());
        }

        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        bars.dedup_by_key(|b| b.date);
        if bars.len() < before {
            warn!(
                "dropped {} duplicate dates in {}",
                before - bars.len(),
                self.path.display()
            );
        }

        Ok(bars)
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        columns: &Columns,
        line: u64,
    ) -> Result<Option<OhlcvBar>, TraderError> {
        let date_str = value(record, columns.date).ok_or_else(|| TraderError::DataParse {
            line,
            reason: "missing date".into(),
        })?;
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
            TraderError::DataParse {
                line,
                reason: format!("invalid date {:?}: {}", date_str, e),
            }
        })?;

        let prices = [columns.open, columns.high, columns.low, columns.close]
            .map(|idx| value(record, idx));
        let [Some(open), Some(high), Some(low), Some(close)] = prices else {
            return Ok(None);
        };

        let bar = OhlcvBar {
            date,
            open: parse_number(open, "open", line)?,
            high: parse_number(high, "high", line)?,
            low: parse_number(low, "low", line)?,
            close: parse_number(close, "close", line)?,
            volume: match columns.volume.and_then(|idx| value(record, idx)) {
                Some(v) => parse_number(v, "volume", line)?,
                None => 0.0,
            },
        };

        let adj_close = match columns.adj_close.and_then(|idx| value(record, idx)) {
            Some(v) if self.adjust_close => Some(parse_number(v, "adj close", line)?),
            _ => None,
        };

        Ok(Some(match adj_close {
            Some(adj) if bar.close != 0.0 => bar.scaled(adj / bar.close),
            _ => bar,
        }))
    }
}

/// Field at `idx`, treating blank and `null` as missing.
fn value(record: &StringRecord, idx: usize) -> Option<&str> {
    record
        .get(idx)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

fn parse_number(raw: &str, field: &str, line: u64) -> Result<f64, TraderError> {
    raw.parse::<f64>().map_err(|e| TraderError::DataParse {
        line,
        reason: format!("invalid {} value {:?}: {}", field, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        let mut bars = self.read_all()?;
        bars.retain(|b| {
            start_date.is_none_or(|start| b.date >= start) && end_date.is_none_or(|end| b.date <= end)
        });
        if bars.is_empty() {
            return Err(TraderError::NoData {
                path: self.path.clone(),
            });
        }
        Ok(bars)
    }

    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TraderError> {
        let bars = self.read_all()?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
