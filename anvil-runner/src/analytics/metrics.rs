//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function of the run's inputs: capitals, equity
//! curve, and trade list in, scalar out. Nothing here touches the runner,
//! the store, or the engine, and recomputing over the same inputs always
//! yields the same values.

use serde::{Deserialize, Serialize};

use anvil_core::{EquityPoint, RoundTrip, Timeframe};

use super::drawdown::episodes;

const MS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0 * 1000.0;

/// Aggregate performance metrics for a single backtest run.
///
/// `Default` is the all-zero report used while a run is in flight or after
/// it failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub monthly_return_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_pct: f64,
    pub avg_drawdown_pct: f64,
    pub max_drawdown_duration_ms: i64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_win: f64,
    pub max_loss: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub expectancy: f64,
    pub avg_holding_period_ms: i64,
    pub pnl_std_dev: f64,
    pub avg_trade_return_pct: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics for one run.
    pub fn compute(
        initial_capital: f64,
        final_capital: f64,
        equity_curve: &[EquityPoint],
        trades: &[RoundTrip],
        timeframe: Timeframe,
    ) -> Self {
        let total = total_return_pct(initial_capital, final_capital);
        let annualized =
            annualized_return_pct(initial_capital, final_capital, equity_curve);
        let eps = episodes(equity_curve);
        let max_dd = max_drawdown_pct(equity_curve);
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        let win_rate = win_rate_pct(trades);
        let avg_w = avg_win(trades);
        let avg_l = avg_loss(trades);

        Self {
            total_return_pct: total,
            annualized_return_pct: annualized,
            monthly_return_pct: monthly_return_pct(initial_capital, final_capital, equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve, timeframe),
            sortino_ratio: sortino_ratio(equity_curve, timeframe),
            calmar_ratio: calmar_ratio(annualized, max_dd),
            max_drawdown_pct: max_dd,
            avg_drawdown_pct: mean_f64(&eps.iter().map(|e| e.depth_pct).collect::<Vec<_>>()),
            max_drawdown_duration_ms: eps.iter().map(|e| e.duration_ms).max().unwrap_or(0),
            total_trades: trades.len(),
            winning_trades: winners,
            losing_trades: trades.len() - winners,
            win_rate_pct: win_rate,
            profit_factor: profit_factor(trades),
            avg_win: avg_w,
            avg_loss: avg_l,
            max_win: trades.iter().map(|t| t.net_pnl).fold(0.0, f64::max),
            max_loss: trades.iter().map(|t| t.net_pnl).fold(0.0, f64::min),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            expectancy: win_rate / 100.0 * avg_w - (1.0 - win_rate / 100.0) * avg_l.abs(),
            avg_holding_period_ms: avg_holding_period_ms(trades),
            pnl_std_dev: pnl_std_dev(trades),
            avg_trade_return_pct: mean_f64(
                &trades.iter().map(|t| t.net_pnl_pct).collect::<Vec<_>>(),
            ),
        }
    }
}

// ─── Return metrics ─────────────────────────────────────────────────

/// Total return in percent. Zero for non-positive initial capital.
pub fn total_return_pct(initial: f64, final_capital: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_capital - initial) / initial * 100.0
}

/// Annualized return in percent, time-normalized over the equity curve's
/// wall-clock span. Falls back to the total return when the span is too
/// short to annualize.
pub fn annualized_return_pct(initial: f64, final_capital: f64, curve: &[EquityPoint]) -> f64 {
    compounded_return_pct(initial, final_capital, curve, MS_PER_YEAR)
}

/// Per-month compounded return in percent.
pub fn monthly_return_pct(initial: f64, final_capital: f64, curve: &[EquityPoint]) -> f64 {
    compounded_return_pct(initial, final_capital, curve, MS_PER_YEAR / 12.0)
}

fn compounded_return_pct(
    initial: f64,
    final_capital: f64,
    curve: &[EquityPoint],
    period_ms: f64,
) -> f64 {
    if initial <= 0.0 || final_capital <= 0.0 {
        return 0.0;
    }
    let total = total_return_pct(initial, final_capital);
    if curve.len() < 2 {
        return total;
    }
    let elapsed_ms = (curve[curve.len() - 1].timestamp - curve[0].timestamp).num_milliseconds();
    if elapsed_ms <= 0 {
        return total;
    }
    let periods = elapsed_ms as f64 / period_ms;
    ((final_capital / initial).powf(1.0 / periods) - 1.0) * 100.0
}

// ─── Risk-adjusted metrics ──────────────────────────────────────────

/// Annualized Sharpe ratio over per-candle returns, risk-free rate zero.
///
/// Returns 0.0 for fewer than 2 points or zero variance.
pub fn sharpe_ratio(curve: &[EquityPoint], timeframe: Timeframe) -> f64 {
    let returns = periodic_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * timeframe.periods_per_year().sqrt()
}

/// Annualized Sortino ratio: downside deviation only.
///
/// Returns 0.0 when there are no negative periodic returns.
pub fn sortino_ratio(curve: &[EquityPoint], timeframe: Timeframe) -> f64 {
    let returns = periodic_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let downside_sq: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).collect();
    if downside_sq.is_empty() {
        return 0.0;
    }
    let downside_std = (downside_sq.iter().sum::<f64>() / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean / downside_std) * timeframe.periods_per_year().sqrt()
}

/// Calmar ratio: annualized return over max drawdown. Zero without a
/// drawdown.
pub fn calmar_ratio(annualized_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct <= 0.0 {
        return 0.0;
    }
    annualized_return_pct / max_drawdown_pct
}

/// Deepest decline from the running peak, 0..100 percent.
pub fn max_drawdown_pct(curve: &[EquityPoint]) -> f64 {
    curve.iter().map(|p| p.drawdown_pct).fold(0.0, f64::max)
}

// ─── Trade statistics ───────────────────────────────────────────────

/// Winning trades as a percent of all trades.
pub fn win_rate_pct(trades: &[RoundTrip]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64 * 100.0
}

/// Gross profits over gross losses, capped at 100.0.
pub fn profit_factor(trades: &[RoundTrip]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean PnL of winning trades. Zero without winners.
pub fn avg_win(trades: &[RoundTrip]) -> f64 {
    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&wins)
}

/// Mean PnL of losing trades, as a negative number. Zero without losers.
pub fn avg_loss(trades: &[RoundTrip]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&losses)
}

/// Mean holding period across all round trips, in milliseconds.
pub fn avg_holding_period_ms(trades: &[RoundTrip]) -> i64 {
    if trades.is_empty() {
        return 0;
    }
    trades.iter().map(|t| t.holding_period_ms).sum::<i64>() / trades.len() as i64
}

/// Sample standard deviation of trade PnL.
pub fn pnl_std_dev(trades: &[RoundTrip]) -> f64 {
    std_dev(&trades.iter().map(|t| t.net_pnl).collect::<Vec<_>>())
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-candle returns from the equity curve.
pub fn periodic_returns(curve: &[EquityPoint]) -> Vec<f64> {
    if curve.len() < 2 {
        return Vec::new();
    }
    curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[RoundTrip], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            if current > max_streak {
                max_streak = current;
            }
        } else {
            current = 0;
        }
    }
    max_streak
}
