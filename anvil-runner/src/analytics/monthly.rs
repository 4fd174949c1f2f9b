//! Calendar-month return buckets.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use anvil_core::{EquityPoint, RoundTrip};

/// Equity return and trade count for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    /// First-to-last equity within the month, in percent.
    pub return_pct: f64,
    /// Round trips that exited in this month.
    pub trade_count: usize,
}

/// Bucket an equity curve and trade list by calendar month, ascending.
pub fn monthly_returns(curve: &[EquityPoint], trades: &[RoundTrip]) -> Vec<MonthlyReturn> {
    // (first, last) equity per month
    let mut buckets: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for point in curve {
        let key = (point.timestamp.year(), point.timestamp.month());
        buckets
            .entry(key)
            .and_modify(|(_, last)| *last = point.equity)
            .or_insert((point.equity, point.equity));
    }

    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for trade in trades {
        let at = trade.exited_at();
        *counts.entry((at.year(), at.month())).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), (first, last))| MonthlyReturn {
            year,
            month,
            return_pct: if first > 0.0 {
                (last - first) / first * 100.0
            } else {
                0.0
            },
            trade_count: counts.get(&(year, month)).copied().unwrap_or(0),
        })
        .collect()
}
