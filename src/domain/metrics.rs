//! Performance summary of a finished run.

use super::portfolio::{EquityPoint, Portfolio};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub start_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    /// Largest peak-to-trough fall as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous peak.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    pub total_commission: f64,
}

impl Metrics {
    /// Trades are classified on net profit.
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        let start_value = portfolio.initial_capital;
        let final_value = portfolio.final_equity();

        let total_return = if start_value > 0.0 {
            (final_value - start_value) / start_value
        } else {
            0.0
        };

        let years = portfolio.equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&portfolio.equity_curve);
        let sharpe_ratio = compute_sharpe(
            &portfolio.equity_curve,
            risk_free_rate / TRADING_DAYS_PER_YEAR,
        );

        let trades = &portfolio.closed_trades;
        let trades_won = trades.iter().filter(|t| t.pnl_comm > 0.0).count();
        let trades_lost = trades.iter().filter(|t| t.pnl_comm < 0.0).count();
        let total_trades = trades.len();
        let trades_breakeven = total_trades - trades_won - trades_lost;

        let total_wins: f64 = trades.iter().map(|t| t.pnl_comm.max(0.0)).sum();
        let total_losses: f64 = trades.iter().map(|t| (-t.pnl_comm).max(0.0)).sum();

        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Metrics {
            start_value,
            final_value,
            total_return,
            annualized_return,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            gross_pnl: trades.iter().map(|t| t.pnl).sum(),
            net_pnl: trades.iter().map(|t| t.pnl_comm).sum(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut run = 0usize;
    let mut max_run = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            run = 0;
            continue;
        }
        run += 1;
        max_run = max_run.max(run);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }

    (max_dd, max_run)
}

fn compute_sharpe(equity_curve: &[EquityPoint], daily_rf: f64) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean - daily_rf) / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
