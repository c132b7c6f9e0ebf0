//! Backtest chart rendered with plotters.
//!
//! Three stacked panels sharing a bar-index x-axis: close price with
//! buy/sell markers, the RSI with its threshold lines, and portfolio value.
//! The output format follows the file extension.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{Order, OrderSide, OrderStatus};
use crate::ports::chart_port::{ChartData, ChartPort};
use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::full_palette::{BLUE_800, GREEN_700, GREY_600, PURPLE_400, RED_700};
use std::fmt::Display;
use std::fs;
use std::path::Path;

pub const DEFAULT_WIDTH: u32 = 1600;
pub const DEFAULT_HEIGHT: u32 = 1000;
/// Smallest edge that still leaves room for three labelled panels.
pub const MIN_EDGE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Bitmap,
    Svg,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Result<Self, TraderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("svg") => Ok(ChartFormat::Svg),
            Some("png" | "jpg" | "jpeg" | "bmp") => Ok(ChartFormat::Bitmap),
            _ => Err(TraderError::Chart {
                reason: format!(
                    "unsupported chart format for {}, use .png or .svg",
                    path.display()
                ),
            }),
        }
    }
}

#[derive(Debug)]
pub struct PlottersChartAdapter {
    size: (u32, u32),
}

impl Default for PlottersChartAdapter {
    fn default() -> Self {
        Self {
            size: (DEFAULT_WIDTH, DEFAULT_HEIGHT),
        }
    }
}

impl PlottersChartAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl ChartPort for PlottersChartAdapter {
    fn render(&self, data: &ChartData<'_>, output_path: &Path) -> Result<(), TraderError> {
        if data.bars.is_empty() {
            return Err(TraderError::Chart {
                reason: "no bars to plot".into(),
            });
        }
        let format = ChartFormat::from_path(output_path)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match format {
            ChartFormat::Bitmap => {
                draw_panels(BitMapBackend::new(output_path, self.size).into_drawing_area(), data)
            }
            ChartFormat::Svg => {
                draw_panels(SVGBackend::new(output_path, self.size).into_drawing_area(), data)
            }
        }
    }
}

fn chart_err<E: Display>(context: &'static str) -> impl FnOnce(E) -> TraderError {
    move |e| TraderError::Chart {
        reason: format!("{}: {}", context, e),
    }
}

fn draw_panels<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    data: &ChartData<'_>,
) -> Result<(), TraderError> {
    root.fill(&WHITE).map_err(chart_err("fill background"))?;

    let (_, height) = root.dim_in_pixel();
    let (price_area, lower) = root.split_vertically(height / 2);
    let (rsi_area, equity_area) = lower.split_vertically(height / 4);

    let bars = data.bars;
    let x_range = 0i64..(bars.len() as i64).max(1);
    let x_fmt = |x: &i64| date_label(bars, *x);

    // Price
    let (lo, hi) = padded_range(bars.iter().flat_map(|b| [b.low, b.high]))
        .unwrap_or((0.0, 1.0));
    let mut price = ChartBuilder::on(&price_area)
        .caption(data.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), lo..hi)
        .map_err(chart_err("build price panel"))?;
    price
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&x_fmt)
        .y_desc("Price")
        .draw()
        .map_err(chart_err("draw price mesh"))?;
    price
        .draw_series(LineSeries::new(
            bars.iter().enumerate().map(|(i, b)| (i as i64, b.close)),
            BLUE_800.stroke_width(1),
        ))
        .map_err(chart_err("draw close"))?
        .label("Close")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE_800));

    let markers = trade_markers(bars, data.orders);
    price
        .draw_series(
            markers
                .iter()
                .filter(|m| m.side == OrderSide::Buy)
                .map(|m| TriangleMarker::new((m.index, m.price), 7, GREEN_700.filled())),
        )
        .map_err(chart_err("draw buy markers"))?
        .label("Buy")
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 5, GREEN_700.filled()));
    price
        .draw_series(
            markers
                .iter()
                .filter(|m| m.side == OrderSide::Sell)
                .map(|m| {
                    EmptyElement::at((m.index, m.price))
                        + Polygon::new(vec![(-6, -6), (6, -6), (0, 6)], RED_700.filled())
                }),
        )
        .map_err(chart_err("draw sell markers"))?
        .label("Sell")
        .legend(|(x, y)| {
            Polygon::new(vec![(x + 5, y - 4), (x + 15, y - 4), (x + 10, y + 4)], RED_700.filled())
        });
    price
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err("draw legend"))?;

    // RSI
    let last_x = bars.len() as i64 - 1;
    let mut rsi = ChartBuilder::on(&rsi_area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), 0.0..100.0)
        .map_err(chart_err("build rsi panel"))?;
    rsi.configure_mesh()
        .x_labels(8)
        .x_label_formatter(&x_fmt)
        .y_labels(5)
        .y_desc(data.rsi.label.as_str())
        .draw()
        .map_err(chart_err("draw rsi mesh"))?;
    rsi.draw_series(LineSeries::new(
        data.rsi
            .values
            .iter()
            .enumerate()
            .filter(|(_, p)| p.valid)
            .map(|(i, p)| (i as i64, p.value)),
        PURPLE_400.stroke_width(1),
    ))
    .map_err(chart_err("draw rsi"))?;
    for level in [data.overbought, data.oversold] {
        rsi.draw_series(LineSeries::new(
            [(0, level), (last_x, level)],
            GREY_600.stroke_width(1),
        ))
        .map_err(chart_err("draw rsi threshold"))?;
    }

    // Equity
    let curve = data.equity_curve;
    let (lo, hi) = padded_range(curve.iter().map(|p| p.equity)).unwrap_or((0.0, 1.0));
    let mut equity = ChartBuilder::on(&equity_area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, lo..hi)
        .map_err(chart_err("build equity panel"))?;
    equity
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&x_fmt)
        .y_desc("Value")
        .draw()
        .map_err(chart_err("draw equity mesh"))?;
    equity
        .draw_series(LineSeries::new(
            curve.iter().enumerate().map(|(i, p)| (i as i64, p.equity)),
            GREEN_700.stroke_width(1),
        ))
        .map_err(chart_err("draw equity"))?;

    root.present().map_err(chart_err("write chart"))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Marker {
    index: i64,
    price: f64,
    side: OrderSide,
}

/// One marker per completed order, placed on the bar it filled.
fn trade_markers(bars: &[OhlcvBar], orders: &[Order]) -> Vec<Marker> {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .filter_map(|o| {
            let exec = o.executed.as_ref()?;
            Some(Marker {
                index: bar_index(bars, exec.date)? as i64,
                price: exec.price,
                side: o.side,
            })
        })
        .collect()
}

fn bar_index(bars: &[OhlcvBar], date: NaiveDate) -> Option<usize> {
    bars.binary_search_by_key(&date, |b| b.date).ok()
}

fn date_label(bars: &[OhlcvBar], x: i64) -> String {
    usize::try_from(x)
        .ok()
        .and_then(|i| bars.get(i))
        .map(|b| b.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Min and max with 5% headroom. Flat series get a unit band.
fn padded_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    Some((lo - pad, hi + pad))
}
