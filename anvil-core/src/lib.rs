//! Anvil Core — the backtest simulation engine.
//!
//! Pure and synchronous: no I/O, no clocks, no globals. The crate contains:
//! - Domain types (candles, strategies, positions, trades, equity points)
//! - Technical indicators with precomputed per-run series
//! - Condition-tree signal evaluation with risk short-circuits
//! - Position sizing policies
//! - Fill engine with percentage slippage and fees
//! - The candle-by-candle simulation loop
//!
//! Orchestration, analytics, and persistence live in `anvil-runner`.

pub mod domain;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod signal;
pub mod sizing;

pub use domain::{
    Candle, CompareOp, ConditionTree, EquityPoint, IndicatorKind, IndicatorRef, Operand,
    Position, RiskPolicy, RoundTrip, SizingPolicy, Strategy, Timeframe, Trade, TradeSide,
};
pub use engine::{simulate, SimError, SimHooks, SimOutput, LOOKBACK};
pub use execution::FillEngine;
pub use indicators::IndicatorSet;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the runner's thread
    /// boundary (rayon batch runs, CLI workers) is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<Timeframe>();
        require_sync::<Timeframe>();
        require_send::<Strategy>();
        require_sync::<Strategy>();
        require_send::<ConditionTree>();
        require_sync::<ConditionTree>();
        require_send::<SizingPolicy>();
        require_sync::<SizingPolicy>();
        require_send::<RiskPolicy>();
        require_sync::<RiskPolicy>();
        require_send::<Trade>();
        require_sync::<Trade>();
        require_send::<RoundTrip>();
        require_sync::<RoundTrip>();
        require_send::<Position>();
        require_sync::<Position>();
        require_send::<EquityPoint>();
        require_sync::<EquityPoint>();
        require_send::<SimOutput>();
        require_sync::<SimOutput>();
        require_send::<IndicatorSet>();
        require_sync::<IndicatorSet>();
    }
}
