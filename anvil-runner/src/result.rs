//! Backtest result artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use anvil_core::{EquityPoint, RoundTrip, Timeframe};

use crate::analytics::{DrawdownEpisode, MonthlyReturn, PerformanceMetrics};
use crate::config::RunConfig;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Default schema version for deserializing older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Complete result of a single backtest run.
///
/// Failed runs carry an `error_message` and the all-zero metrics; they are
/// persisted just like successful ones so failures stay inspectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: String,
    pub strategy_id: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub peak_capital: f64,
    pub trades: Vec<RoundTrip>,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdowns: Vec<DrawdownEpisode>,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub metrics: PerformanceMetrics,
    pub execution_time_ms: u64,
    pub error_message: Option<String>,
}

impl BacktestResult {
    /// Fresh in-flight result for a config, before any data is loaded.
    pub fn running(config: &RunConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: config.run_id(),
            strategy_id: config.strategy_id.clone(),
            symbol: config.symbols.first().cloned().unwrap_or_default(),
            timeframe: config.timeframe,
            status: RunStatus::Running,
            started_at,
            completed_at: None,
            initial_capital: config.initial_capital,
            final_capital: config.initial_capital,
            peak_capital: config.initial_capital,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            drawdowns: Vec::new(),
            monthly_returns: Vec::new(),
            metrics: PerformanceMetrics::default(),
            execution_time_ms: 0,
            error_message: None,
        }
    }

    pub fn summary(&self) -> BacktestSummary {
        BacktestSummary {
            id: self.id.clone(),
            strategy_id: self.strategy_id.clone(),
            symbol: self.symbol.clone(),
            status: self.status,
            total_return_pct: self.metrics.total_return_pct,
            sharpe_ratio: self.metrics.sharpe_ratio,
            max_drawdown_pct: self.metrics.max_drawdown_pct,
            total_trades: self.metrics.total_trades,
            completed_at: self.completed_at,
        }
    }
}

/// Compact projection for listings and comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub id: String,
    pub strategy_id: String,
    pub symbol: String,
    pub status: RunStatus,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub total_trades: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_core::Timeframe;

    fn config() -> RunConfig {
        RunConfig {
            strategy_id: "s1".into(),
            symbols: vec!["BTCUSDT".into()],
            timeframe: Timeframe::H1,
            start_date: "2024-01-01".into(),
            end_date: "2024-06-30".into(),
            initial_capital: 10_000.0,
            fee_rate_pct: 0.1,
            slippage_pct: 0.05,
            allow_margin: false,
        }
    }

    #[test]
    fn running_result_starts_empty() {
        let r = BacktestResult::running(&config(), Utc::now());
        assert_eq!(r.status, RunStatus::Running);
        assert_eq!(r.final_capital, 10_000.0);
        assert!(r.trades.is_empty());
        assert_eq!(r.metrics, PerformanceMetrics::default());
        assert_eq!(r.symbol, "BTCUSDT");
    }

    #[test]
    fn result_serialization_roundtrip() {
        let r = BacktestResult::running(&config(), Utc::now());
        let json = serde_json::to_string(&r).unwrap();
        let deser: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.id, r.id);
        assert_eq!(deser.status, RunStatus::Running);
        assert_eq!(deser.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn schema_version_defaults_for_old_json() {
        let r = BacktestResult::running(&config(), Utc::now());
        let mut value: serde_json::Value = serde_json::to_value(&r).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let deser: BacktestResult = serde_json::from_value(value).unwrap();
        assert_eq!(deser.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn summary_projects_metrics() {
        let mut r = BacktestResult::running(&config(), Utc::now());
        r.metrics.total_return_pct = 12.5;
        r.metrics.total_trades = 7;
        let s = r.summary();
        assert_eq!(s.total_return_pct, 12.5);
        assert_eq!(s.total_trades, 7);
        assert_eq!(s.id, r.id);
    }
}
