//! Trade fills and round-trip records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A single executed fill.
///
/// `price` is the fill price after slippage; `value` is `quantity * price`;
/// `fee` is charged on top of (buy) or out of (sell) the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub value: f64,
    pub fee: f64,
    pub executed_at: DateTime<Utc>,
}

/// A completed round trip: entry fill paired with its exit fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub entry: Trade,
    pub exit: Trade,
    pub gross_pnl: f64,
    pub total_fees: f64,
    pub net_pnl: f64,
    /// Price return in percent, net of the round-trip fee rate.
    pub net_pnl_pct: f64,
    pub holding_period_ms: i64,
}

impl RoundTrip {
    /// Pair an entry with its exit and settle the PnL.
    pub fn close(entry: Trade, exit: Trade, fee_rate_pct: f64) -> Self {
        let gross_pnl = exit.value - entry.value;
        let total_fees = entry.fee + exit.fee;
        let net_pnl = gross_pnl - total_fees;
        let net_pnl_pct = if entry.price > 0.0 {
            (exit.price - entry.price) / entry.price * 100.0 - fee_rate_pct * 2.0
        } else {
            0.0
        };
        let holding_period_ms = (exit.executed_at - entry.executed_at).num_milliseconds();
        Self {
            entry,
            exit,
            gross_pnl,
            total_fees,
            net_pnl,
            net_pnl_pct,
            holding_period_ms,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn entered_at(&self) -> DateTime<Utc> {
        self.entry.executed_at
    }

    pub fn exited_at(&self) -> DateTime<Utc> {
        self.exit.executed_at
    }
}
