//! Open position state. Long-only, at most one at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trade::Trade;

/// A currently open long position.
///
/// The entry fill is kept whole so the eventual round trip carries the exact
/// entry accounting, fees included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_trade: Trade,
    pub entered_at: DateTime<Utc>,
}

impl Position {
    pub fn from_entry(entry: Trade) -> Self {
        Self {
            quantity: entry.quantity,
            entry_price: entry.price,
            entered_at: entry.executed_at,
            entry_trade: entry,
        }
    }

    /// Mark-to-market value at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeSide;
    use chrono::TimeZone;

    fn position() -> Position {
        Position::from_entry(Trade {
            id: 1,
            side: TradeSide::Buy,
            quantity: 5.0,
            price: 200.0,
            value: 1000.0,
            fee: 1.0,
            executed_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        })
    }

    #[test]
    fn market_value_tracks_price() {
        let p = position();
        assert!((p.market_value(210.0) - 1050.0).abs() < 1e-10);
    }

    #[test]
    fn from_entry_keeps_the_fill() {
        let p = position();
        assert_eq!(p.quantity, p.entry_trade.quantity);
        assert_eq!(p.entry_price, p.entry_trade.price);
        assert_eq!(p.entered_at, p.entry_trade.executed_at);
    }
}
