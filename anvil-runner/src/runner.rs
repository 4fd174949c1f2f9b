//! Backtest orchestrator — wires strategies, price data, the simulation
//! core, analytics, and the result store together.
//!
//! The central contract: `run_backtest` never propagates an error. Every
//! failure (missing strategy, bad input, thin data, upstream outage,
//! cancellation) is folded into a `Failed` result that is persisted and
//! returned, so a batch of runs never aborts and failures stay
//! inspectable next to successes.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use anvil_core::engine::{simulate, SimError, SimHooks, LOOKBACK};
use anvil_core::RoundTrip;

use crate::analytics::{episodes, monthly_returns, PerformanceMetrics};
use crate::config::{ConfigError, RunConfig};
use crate::insight::insights;
use crate::ports::{
    DataError, PriceDataService, ResultRepository, RunHooks, StoreError, StrategyRepository,
};
use crate::result::{BacktestResult, BacktestSummary, RunStatus};

/// Minimum candles a run needs: the warmup window plus one tradable candle.
pub const MIN_CANDLES: usize = LOOKBACK + 1;

/// Errors the orchestrator folds into failed results (or returns from the
/// query surface).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("strategy '{0}' not found")]
    StrategyNotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient data: {got} candles, need at least {need}")]
    InsufficientData { got: usize, need: usize },
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("result '{0}' not found")]
    ResultNotFound(String),
    #[error("run cancelled")]
    Cancelled,
}

/// The orchestrator. Collaborators come in as trait objects so batch runs
/// can share them across threads.
pub struct BacktestRunner {
    strategies: Arc<dyn StrategyRepository>,
    prices: Arc<dyn PriceDataService>,
    results: Arc<dyn ResultRepository>,
}

impl BacktestRunner {
    pub fn new(
        strategies: Arc<dyn StrategyRepository>,
        prices: Arc<dyn PriceDataService>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            strategies,
            prices,
            results,
        }
    }

    /// Execute one backtest run. Always returns a result; never errors.
    ///
    /// The result is persisted on success and on failure. A store failure
    /// is logged and swallowed: persistence is best-effort and must not
    /// mask the run's own outcome.
    pub fn run_backtest(&self, config: &RunConfig, hooks: &RunHooks) -> BacktestResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut result = BacktestResult::running(config, started_at);
        info!(run_id = %result.id, strategy_id = %config.strategy_id, "backtest started");
        hooks.report(0, "starting");

        match self.execute(config, hooks, &mut result) {
            Ok(()) => {
                result.status = RunStatus::Completed;
                hooks.report(100, "done");
                info!(
                    run_id = %result.id,
                    trades = result.metrics.total_trades,
                    total_return_pct = result.metrics.total_return_pct,
                    "backtest completed"
                );
            }
            Err(err) => {
                result.status = RunStatus::Failed;
                result.error_message = Some(err.to_string());
                warn!(run_id = %result.id, error = %err, "backtest failed");
            }
        }

        result.execution_time_ms = clock.elapsed().as_millis() as u64;
        result.completed_at = Some(Utc::now());

        if let Err(err) = self.results.save(&result) {
            warn!(run_id = %result.id, error = %err, "failed to persist result");
        }

        result
    }

    fn execute(
        &self,
        config: &RunConfig,
        hooks: &RunHooks,
        result: &mut BacktestResult,
    ) -> Result<(), RunError> {
        config.validate()?;
        check_cancel(hooks)?;

        let strategy = self
            .strategies
            .get_by_id(&config.strategy_id)?
            .ok_or_else(|| RunError::StrategyNotFound(config.strategy_id.clone()))?;
        hooks.report(10, "strategy loaded");

        // Single-symbol contract: config list overrides, strategy list is
        // the fallback. Multi-symbol evaluation is expressed as one run
        // per symbol through the batch runner.
        let symbol = config
            .symbols
            .first()
            .or_else(|| strategy.symbols.first())
            .cloned()
            .ok_or_else(|| RunError::InvalidInput("no symbol configured".into()))?;
        result.symbol = symbol.clone();

        let candles =
            self.prices
                .historical_candles(&symbol, config.timeframe, config.start()?, config.end()?)?;
        if candles.len() < MIN_CANDLES {
            return Err(RunError::InsufficientData {
                got: candles.len(),
                need: MIN_CANDLES,
            });
        }
        hooks.report(20, "data loaded");
        check_cancel(hooks)?;

        // Bridge orchestrator hooks into the engine: the loop's 0..100
        // maps into the 20..80 band of the overall run.
        let mut on_progress = |p: u8| {
            hooks.report(20 + (p as u16 * 60 / 100) as u8, "simulating");
        };
        let mut on_trade = |rt: &RoundTrip| {
            if let Some(cb) = &hooks.on_trade {
                cb(rt);
            }
        };
        let cancel_flag = hooks.cancel.as_deref();
        let mut sim_hooks = SimHooks {
            on_progress: Some(&mut on_progress),
            on_trade: Some(&mut on_trade),
            cancel: cancel_flag,
        };

        let sim = simulate(
            &candles,
            &strategy,
            config.initial_capital,
            config.fee_rate_pct,
            config.slippage_pct,
            &mut sim_hooks,
        )
        .map_err(|err| match err {
            SimError::Cancelled => RunError::Cancelled,
        })?;
        hooks.report(80, "computing analytics");

        result.metrics = PerformanceMetrics::compute(
            config.initial_capital,
            sim.final_capital,
            &sim.equity_curve,
            &sim.trades,
            config.timeframe,
        );
        result.drawdowns = episodes(&sim.equity_curve);
        result.monthly_returns = monthly_returns(&sim.equity_curve, &sim.trades);
        result.final_capital = sim.final_capital;
        result.peak_capital = sim.peak_capital;
        result.trades = sim.trades;
        result.equity_curve = sim.equity_curve;
        hooks.report(90, "saving result");

        Ok(())
    }

    /// Threshold insights for a stored result.
    pub fn analyze_result(&self, id: &str) -> Result<Vec<String>, RunError> {
        let result = self
            .results
            .get_by_id(id)?
            .ok_or_else(|| RunError::ResultNotFound(id.to_string()))?;
        Ok(insights(&result.metrics))
    }

    /// Summaries of the stored results for the given IDs, in input order.
    pub fn compare_strategies(&self, ids: &[String]) -> Result<Vec<BacktestSummary>, RunError> {
        ids.iter()
            .map(|id| {
                self.results
                    .get_by_id(id)?
                    .map(|r| r.summary())
                    .ok_or_else(|| RunError::ResultNotFound(id.clone()))
            })
            .collect()
    }

    /// Most recent stored results, newest first.
    pub fn recent_results(&self, limit: usize) -> Result<Vec<BacktestSummary>, RunError> {
        Ok(self.results.list_recent(limit)?)
    }
}

fn check_cancel(hooks: &RunHooks) -> Result<(), RunError> {
    match &hooks.cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(RunError::Cancelled),
        _ => Ok(()),
    }
}
