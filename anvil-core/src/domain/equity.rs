//! Equity curve points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One mark-to-market snapshot per simulated candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// cash + position market value.
    pub equity: f64,
    pub cash: f64,
    pub position_value: f64,
    /// Decline from the running equity peak, 0..100 percent.
    pub drawdown_pct: f64,
}
