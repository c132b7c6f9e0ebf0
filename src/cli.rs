//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{debug, info, LevelFilter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::chart_adapter::{
    PlottersChartAdapter, DEFAULT_HEIGHT, DEFAULT_WIDTH, MIN_EDGE,
};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    run_backtest, BacktestConfig, BacktestResult, DEFAULT_COMMISSION, DEFAULT_INITIAL_CAPITAL,
    DEFAULT_STAKE,
};
use crate::domain::config_validation::{
    parse_optional_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::TraderError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::{
    LogLine, RsiParams, RsiStrategy, DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD, DEFAULT_RSI_PERIOD,
};
use crate::ports::chart_port::{ChartData, ChartPort};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_CHART_OUTPUT: &str = "backtest.png";

#[derive(Parser, Debug)]
#[command(name = "rsitrader", about = "RSI mean-reversion backtester")]
pub struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Price CSV, overrides [backtest] data_file
        #[arg(long)]
        data: Option<PathBuf>,
        /// Chart output, overrides [chart] output
        #[arg(long, conflicts_with = "no_plot")]
        plot: Option<PathBuf>,
        #[arg(long)]
        no_plot: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and date range of a price file
    Info {
        #[arg(long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            plot,
            no_plot,
            dry_run,
        } => run_backtest_command(
            config.as_deref(),
            data.as_deref(),
            plot.as_deref(),
            no_plot,
            dry_run,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TraderError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Loads `path`, or an empty configuration where every key takes its default.
fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, TraderError> {
    match path {
        Some(p) => load_config(p),
        None => FileConfigAdapter::from_string(""),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TraderError> {
    Ok(BacktestConfig {
        start_date: parse_optional_date(config, "start_date")?,
        end_date: parse_optional_date(config, "end_date")?,
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        commission: config.get_double("backtest", "commission", DEFAULT_COMMISSION),
        commission_per_trade: config.get_double("backtest", "commission_per_trade", 0.0),
        stake: config.get_int("backtest", "stake", DEFAULT_STAKE),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
    })
}

pub fn build_rsi_params(config: &dyn ConfigPort) -> RsiParams {
    let period = config.get_int("strategy", "rsi_period", DEFAULT_RSI_PERIOD as i64);
    RsiParams {
        rsi_period: usize::try_from(period).unwrap_or(DEFAULT_RSI_PERIOD),
        overbought: config.get_double("strategy", "overbought", DEFAULT_OVERBOUGHT),
        oversold: config.get_double("strategy", "oversold", DEFAULT_OVERSOLD),
    }
}

/// `--data` wins over `[backtest] data_file`.
pub fn resolve_data_file(
    data_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, TraderError> {
    if let Some(p) = data_override {
        return Ok(p.to_path_buf());
    }
    config
        .get_non_empty("backtest", "data_file")
        .map(PathBuf::from)
        .ok_or_else(|| TraderError::missing("backtest", "data_file"))
}

/// Where to write the chart, or `None` when plotting is off.
pub fn resolve_chart_path(
    plot_override: Option<&Path>,
    no_plot: bool,
    config: &dyn ConfigPort,
) -> Option<PathBuf> {
    if no_plot {
        return None;
    }
    if let Some(p) = plot_override {
        return Some(p.to_path_buf());
    }
    if !config.get_bool("chart", "enabled", true) {
        return None;
    }
    Some(PathBuf::from(
        config
            .get_non_empty("chart", "output")
            .unwrap_or_else(|| DEFAULT_CHART_OUTPUT.to_string()),
    ))
}

pub fn build_data_port(data_file: PathBuf, config: &dyn ConfigPort) -> CsvAdapter {
    CsvAdapter::new(data_file).with_adjust_close(config.get_bool("backtest", "adjust_close", true))
}

/// Chart adapter sized from `[chart] width` and `height`.
pub fn build_chart_adapter(config: &dyn ConfigPort) -> Result<PlottersChartAdapter, TraderError> {
    let edge = |key: &str, default: u32| {
        let value = config.get_int("chart", key, i64::from(default));
        u32::try_from(value)
            .ok()
            .filter(|v| *v >= MIN_EDGE)
            .ok_or_else(|| {
                TraderError::invalid(
                    "chart",
                    key,
                    format!("{} must be at least {} pixels", key, MIN_EDGE),
                )
            })
    };
    let width = edge("width", DEFAULT_WIDTH)?;
    let height = edge("height", DEFAULT_HEIGHT)?;
    Ok(PlottersChartAdapter::new().with_size(width, height))
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub bars: Vec<OhlcvBar>,
    pub params: RsiParams,
    pub rsi: IndicatorSeries,
    pub result: BacktestResult,
    pub metrics: Metrics,
    pub journal: Vec<LogLine>,
}

/// Load bars, run the RSI strategy and compute metrics.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    params: RsiParams,
) -> Result<PipelineOutput, TraderError> {
    let bars = data_port.fetch_ohlcv(bt_config.start_date, bt_config.end_date)?;
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        info!("Loaded {} bars, {} to {}", bars.len(), first.date, last.date);
    }

    let mut strategy = RsiStrategy::new(params);
    let result = run_backtest(&bars, &mut strategy, bt_config)?;
    if let Some(first) = strategy.rsi().first_valid() {
        debug!("{} valid from bar {}", strategy.rsi().label, first);
    }
    let unfilled = result.orders.iter().filter(|o| o.is_alive()).count();
    if unfilled > 0 {
        info!("{} order(s) placed on the last bar were never filled", unfilled);
    }
    let metrics = Metrics::compute(&result.portfolio, bt_config.risk_free_rate);
    let rsi = strategy.rsi().clone();

    Ok(PipelineOutput {
        bars,
        params,
        rsi,
        result,
        metrics,
        journal: strategy.into_journal(),
    })
}

/// Chart a finished run. Called once the journal is out, so a chart failure
/// never hides it.
pub fn render_chart(
    output: &PipelineOutput,
    port: &dyn ChartPort,
    path: &Path,
) -> Result<(), TraderError> {
    let params = &output.params;
    let title = format!(
        "{} ({:.0}/{:.0})",
        output.rsi.label, params.oversold, params.overbought
    );
    let data = ChartData {
        title: &title,
        bars: &output.bars,
        rsi: &output.rsi,
        overbought: params.overbought,
        oversold: params.oversold,
        orders: &output.result.orders,
        equity_curve: &output.result.portfolio.equity_curve,
    };
    port.render(&data, path)?;
    info!("Chart written to {}", path.display());
    Ok(())
}

fn run_backtest_command(
    config_path: Option<&Path>,
    data_override: Option<&Path>,
    plot_override: Option<&Path>,
    no_plot: bool,
    dry_run: bool,
) -> Result<(), TraderError> {
    let config = load_optional_config(config_path)?;
    validate_backtest_config(&config)?;
    validate_strategy_config(&config)?;

    let bt_config = build_backtest_config(&config)?;
    let params = build_rsi_params(&config);
    let data_file = resolve_data_file(data_override, &config)?;
    let chart_path = resolve_chart_path(plot_override, no_plot, &config);
    let chart_adapter = build_chart_adapter(&config)?;

    if dry_run {
        print_settings(
            &data_file,
            &bt_config,
            &params,
            chart_path.as_deref(),
            &chart_adapter,
        );
        eprintln!("\nDry run complete: configuration is valid");
        return Ok(());
    }

    let data_port = build_data_port(data_file, &config);

    println!("Starting Portfolio Value: {:.2}", bt_config.initial_capital);
    let output = run_pipeline(&data_port, &bt_config, params)?;

    for line in &output.journal {
        println!("{}", line);
    }
    println!("Final Portfolio Value: {:.2}", output.result.final_value());
    print_metrics(&output.metrics);

    if let Some(path) = chart_path {
        render_chart(&output, &chart_adapter, &path)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;
    validate_strategy_config(&config)?;

    let bt_config = build_backtest_config(&config)?;
    let params = build_rsi_params(&config);
    let data_file = resolve_data_file(None, &config)?;
    let chart_path = resolve_chart_path(None, false, &config);
    let chart_adapter = build_chart_adapter(&config)?;

    print_settings(
        &data_file,
        &bt_config,
        &params,
        chart_path.as_deref(),
        &chart_adapter,
    );
    eprintln!("\nConfiguration is valid");
    Ok(())
}

fn run_info(data_file: &Path) -> Result<(), TraderError> {
    let adapter = CsvAdapter::new(data_file.to_path_buf());
    match adapter.get_data_range()? {
        Some((first, last, count)) => {
            println!("{}: {} bars, {} to {}", adapter.path().display(), count, first, last);
            Ok(())
        }
        None => Err(TraderError::NoData {
            path: data_file.to_path_buf(),
        }),
    }
}

fn print_settings(
    data_file: &Path,
    bt_config: &BacktestConfig,
    params: &RsiParams,
    chart_path: Option<&Path>,
    chart: &PlottersChartAdapter,
) {
    let date_or = |d: Option<chrono::NaiveDate>, fallback: &str| {
        d.map(|d| d.to_string()).unwrap_or_else(|| fallback.to_string())
    };
    println!("Data:             {}", data_file.display());
    println!(
        "Range:            {} to {}",
        date_or(bt_config.start_date, "first bar"),
        date_or(bt_config.end_date, "last bar")
    );
    println!("Initial capital:  {:.2}", bt_config.initial_capital);
    println!(
        "Commission:       {:.4}% + {:.2} per order",
        bt_config.commission * 100.0,
        bt_config.commission_per_trade
    );
    println!("Stake:            {}", bt_config.stake);
    println!(
        "RSI:              period {}, oversold {:.1}, overbought {:.1}",
        params.rsi_period, params.oversold, params.overbought
    );
    match chart_path {
        Some(p) => {
            let (width, height) = chart.size();
            println!("Chart:            {} ({}x{})", p.display(), width, height);
        }
        None => println!("Chart:            disabled"),
    }
}

fn print_metrics(m: &Metrics) {
    println!("\n=== Results ===");
    println!("Total Return:     {:.2}%", m.total_return * 100.0);
    println!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    println!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    println!(
        "Max Drawdown:     -{:.2}% ({} bars)",
        m.max_drawdown * 100.0,
        m.max_drawdown_duration
    );
    println!(
        "Trades:           {} ({} won, {} lost, {} even)",
        m.total_trades, m.trades_won, m.trades_lost, m.trades_breakeven
    );
    println!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:    {:.2}", m.profit_factor);
    println!(
        "PnL:              gross {:.2}, net {:.2}, commission {:.2}",
        m.gross_pnl, m.net_pnl, m.total_commission
    );
}
