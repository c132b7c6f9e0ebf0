#![allow(dead_code)]

use chrono::NaiveDate;
pub use rsitrader::domain::backtest::BacktestConfig;
use rsitrader::domain::error::TraderError;
pub use rsitrader::domain::ohlcv::OhlcvBar;
use rsitrader::ports::chart_port::{ChartData, ChartPort};
use rsitrader::ports::data_port::DataPort;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        if let Some(reason) = &self.error {
            return Err(TraderError::DataRead {
                path: PathBuf::from("mock.csv"),
                reason: reason.clone(),
            });
        }
        let bars: Vec<OhlcvBar> = self
            .bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(TraderError::NoData {
                path: PathBuf::from("mock.csv"),
            });
        }
        Ok(bars)
    }

    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TraderError> {
        Ok(match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, self.bars.len())),
            _ => None,
        })
    }
}

/// What a render call was handed.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub path: PathBuf,
    pub title: String,
    pub bars: usize,
    pub rsi_points: usize,
    pub orders: usize,
    pub equity_points: usize,
}

#[derive(Default)]
pub struct RecordingChartPort {
    pub calls: RefCell<Vec<RenderCall>>,
    fail: Option<String>,
}

impl RecordingChartPort {
    /// Records the call, then fails the way a missing font or bad path would.
    pub fn failing(reason: &str) -> Self {
        RecordingChartPort {
            calls: RefCell::default(),
            fail: Some(reason.to_string()),
        }
    }
}

impl ChartPort for RecordingChartPort {
    fn render(&self, data: &ChartData<'_>, output_path: &Path) -> Result<(), TraderError> {
        self.calls.borrow_mut().push(RenderCall {
            path: output_path.to_path_buf(),
            title: data.title.to_string(),
            bars: data.bars.len(),
            rsi_points: data.rsi.len(),
            orders: data.orders.len(),
            equity_points: data.equity_curve.len(),
        });
        match &self.fail {
            Some(reason) => Err(TraderError::Chart {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar whose open equals its close.
pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per calendar day from 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + chrono::Duration::days(i as i64), c))
        .collect()
}

/// Falls one point a bar from 100 for `down` bars, then rises one point a
/// bar for `up` bars.
pub fn v_shape_closes(down: usize, up: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..down).map(|i| 100.0 - i as f64).collect();
    let bottom = closes.last().copied().unwrap_or(100.0);
    closes.extend((1..=up).map(|k| bottom + k as f64));
    closes
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::default()
}

/// Writes bars as a Yahoo style CSV into a fresh temp directory.
pub fn write_temp_csv(bars: &[OhlcvBar]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prices.csv");
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.close,
            b.volume
        ));
    }
    fs::write(&path, content).unwrap();
    (dir, path)
}

pub fn write_temp_ini(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("rsitrader.ini");
    fs::write(&path, content).unwrap();
    path
}
