//! Ports — trait seams for the runner's external collaborators.
//!
//! The orchestrator only ever talks to these traits; CSV files, synthetic
//! generators, and the JSONL store are adapters behind them. All ports are
//! `Send + Sync` so batch runs can share them across rayon workers.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use anvil_core::{Candle, RoundTrip, Strategy, Timeframe};

use crate::result::{BacktestResult, BacktestSummary};

/// Errors from strategy and price-data sources.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no data for symbol '{0}'")]
    NoData(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Errors from the result store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("result '{0}' not found")]
    NotFound(String),
}

/// Source of strategy documents.
pub trait StrategyRepository: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Option<Strategy>, DataError>;
}

/// Source of historical candles, ascending by timestamp.
pub trait PriceDataService: Send + Sync {
    fn historical_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataError>;
}

/// Sink and query surface for backtest results.
pub trait ResultRepository: Send + Sync {
    fn save(&self, result: &BacktestResult) -> Result<(), StoreError>;
    fn get_by_id(&self, id: &str) -> Result<Option<BacktestResult>, StoreError>;
    fn list_recent(&self, limit: usize) -> Result<Vec<BacktestSummary>, StoreError>;
}

/// Observation hooks for one orchestrated run.
///
/// Callbacks are synchronous and must not block; the runner invokes them
/// from the simulation thread.
#[derive(Default)]
pub struct RunHooks {
    /// Progress percent (0..=100) and a short stage label.
    pub on_progress: Option<Box<dyn Fn(u8, &str) + Send + Sync>>,
    /// Fired per round trip closed by an exit signal.
    pub on_trade: Option<Box<dyn Fn(&RoundTrip) + Send + Sync>>,
    /// Cooperative cancellation, polled at progress milestones.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl RunHooks {
    pub(crate) fn report(&self, pct: u8, stage: &str) {
        if let Some(cb) = &self.on_progress {
            cb(pct, stage);
        }
    }
}
