//! The simulation engine — one pass over the candle series.
//!
//! Per-candle order of operations:
//! 1. Mark to market and record an equity point (peak/drawdown update).
//! 2. If a position is open, check the exit; on exit, settle the round trip
//!    and fire the trade callback.
//! 3. If flat (including the candle an exit just vacated), check the entry
//!    and open a sized position.
//!
//! The first `LOOKBACK` candles are warmup only: indicators read them but
//! no equity point or trade is produced, so the equity curve always has
//! `candles.len() - LOOKBACK` points. At end of data any open position is
//! force-liquidated at the last close without slippage and without firing
//! the trade callback.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::domain::strategy::Strategy;
use crate::domain::{Candle, EquityPoint, Position, RoundTrip};
use crate::execution::FillEngine;
use crate::indicators::IndicatorSet;
use crate::signal::{entry_signal, exit_signal};
use crate::sizing::size_position;

/// Candles reserved for indicator warmup before trading begins.
pub const LOOKBACK: usize = 50;

/// Progress and cancellation cadence, in candles.
const PROGRESS_INTERVAL: usize = 100;

/// Errors from the simulation loop.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation cancelled")]
    Cancelled,
}

/// Observation hooks for a single simulation run. All callbacks are
/// synchronous and must not block.
pub struct SimHooks<'a> {
    /// Percent of the trading window processed, reported every
    /// 100 candles.
    pub on_progress: Option<&'a mut dyn FnMut(u8)>,
    /// Fired for each round trip closed by an exit signal. The forced
    /// end-of-data liquidation does not fire it.
    pub on_trade: Option<&'a mut dyn FnMut(&RoundTrip)>,
    /// Cooperative cancellation flag, checked at the progress cadence.
    pub cancel: Option<&'a AtomicBool>,
}

impl Default for SimHooks<'_> {
    fn default() -> Self {
        Self {
            on_progress: None,
            on_trade: None,
            cancel: None,
        }
    }
}

/// Everything a run produces before analytics.
#[derive(Debug, Clone)]
pub struct SimOutput {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<RoundTrip>,
    pub final_capital: f64,
    pub peak_capital: f64,
}

/// Run one backtest simulation.
///
/// Callers validate series length up front; with `candles.len() <= LOOKBACK`
/// the loop body never runs and the output is an empty curve at the initial
/// capital.
pub fn simulate(
    candles: &[Candle],
    strategy: &Strategy,
    initial_capital: f64,
    fee_rate_pct: f64,
    slippage_pct: f64,
    hooks: &mut SimHooks<'_>,
) -> Result<SimOutput, SimError> {
    let set = IndicatorSet::compute(candles, &[&strategy.entry, &strategy.exit]);
    let mut fills = FillEngine::new(fee_rate_pct, slippage_pct);

    let mut cash = initial_capital;
    let mut peak = initial_capital;
    let mut position: Option<Position> = None;
    let mut equity_curve = Vec::with_capacity(candles.len().saturating_sub(LOOKBACK));
    let mut trades = Vec::new();

    let span = candles.len().saturating_sub(LOOKBACK).max(1);

    for i in LOOKBACK..candles.len() {
        let candle = &candles[i];

        // 1. Mark to market
        let position_value = position
            .as_ref()
            .map(|p| p.market_value(candle.close))
            .unwrap_or(0.0);
        let equity = cash + position_value;
        if equity > peak {
            peak = equity;
        }
        let drawdown_pct = if peak > 0.0 {
            (peak - equity) / peak * 100.0
        } else {
            0.0
        };
        equity_curve.push(EquityPoint {
            timestamp: candle.timestamp,
            equity,
            cash,
            position_value,
            drawdown_pct,
        });

        // 2. Exit check
        if let Some(open) = position.take() {
            let should_exit = exit_signal(
                &strategy.exit,
                &set,
                i,
                candle.close,
                open.entry_price,
                &strategy.risk,
            );
            if should_exit {
                let exit = fills.sell(open.quantity, candle.close, candle.timestamp);
                cash += exit.value - exit.fee;
                let round_trip = RoundTrip::close(open.entry_trade, exit, fee_rate_pct);
                if let Some(cb) = hooks.on_trade.as_mut() {
                    cb(&round_trip);
                }
                trades.push(round_trip);
            } else {
                position = Some(open);
            }
        }

        // 3. Entry check, on the same candle an exit may have vacated
        if position.is_none() && entry_signal(&strategy.entry, &set, i) {
            let notional = size_position(cash, candle.close, &strategy.sizing, &strategy.risk);
            // The fee is charged on top of the notional; shrink the fill
            // so the total cost never overdraws cash
            let affordable = cash / (1.0 + fills.fee_rate_pct() / 100.0);
            let notional = notional.min(affordable);
            if notional > 0.0 {
                let entry = fills.buy(notional, candle.close, candle.timestamp);
                cash -= entry.value + entry.fee;
                position = Some(Position::from_entry(entry));
            }
        }

        if (i - LOOKBACK) % PROGRESS_INTERVAL == 0 {
            if let Some(flag) = hooks.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(SimError::Cancelled);
                }
            }
            if let Some(cb) = hooks.on_progress.as_mut() {
                cb(((i - LOOKBACK) * 100 / span) as u8);
            }
        }
    }

    // Forced end-of-data liquidation: raw close, no slippage, no callback
    if let (Some(open), Some(last)) = (position.take(), candles.last()) {
        let exit = fills.liquidate(open.quantity, last.close, last.timestamp);
        cash += exit.value - exit.fee;
        trades.push(RoundTrip::close(open.entry_trade, exit, fee_rate_pct));
    }

    Ok(SimOutput {
        equity_curve,
        trades,
        final_capital: cash,
        peak_capital: peak,
    })
}
