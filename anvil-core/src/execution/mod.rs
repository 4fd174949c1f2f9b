//! Execution model — turns intents into fills with slippage and fees.
//!
//! Slippage is a fixed percentage applied against the trade direction:
//! buys fill above the close, sells below it. Fees are proportional to the
//! filled value. Trade IDs are sequential so a run's fills are reproducible
//! without any external ID source.

use chrono::{DateTime, Utc};

use crate::domain::trade::{Trade, TradeSide};

/// Deterministic sequential trade IDs, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct TradeIdGen {
    next: u64,
}

impl TradeIdGen {
    pub fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Fill engine for one simulation run.
#[derive(Debug)]
pub struct FillEngine {
    fee_rate_pct: f64,
    slippage_pct: f64,
    ids: TradeIdGen,
}

impl FillEngine {
    pub fn new(fee_rate_pct: f64, slippage_pct: f64) -> Self {
        Self {
            fee_rate_pct,
            slippage_pct,
            ids: TradeIdGen::default(),
        }
    }

    pub fn fee_rate_pct(&self) -> f64 {
        self.fee_rate_pct
    }

    /// Fill a buy for the given notional at the candle close.
    ///
    /// The fill price is marked up by slippage; the returned trade's `value`
    /// equals the requested notional and its `fee` comes on top of it.
    pub fn buy(&mut self, notional: f64, close: f64, at: DateTime<Utc>) -> Trade {
        let price = close * (1.0 + self.slippage_pct / 100.0);
        let quantity = notional / price;
        let value = quantity * price;
        Trade {
            id: self.ids.next_id(),
            side: TradeSide::Buy,
            quantity,
            price,
            value,
            fee: value * self.fee_rate_pct / 100.0,
            executed_at: at,
        }
    }

    /// Fill a sell of the given quantity at the candle close, marked down
    /// by slippage. The fee comes out of the proceeds.
    pub fn sell(&mut self, quantity: f64, close: f64, at: DateTime<Utc>) -> Trade {
        let price = close * (1.0 - self.slippage_pct / 100.0);
        self.sell_at(quantity, price, at)
    }

    /// Close out a position at the raw close with no slippage.
    ///
    /// Used for the forced end-of-data exit: it is an accounting boundary
    /// of the simulation, not a modeled execution.
    pub fn liquidate(&mut self, quantity: f64, close: f64, at: DateTime<Utc>) -> Trade {
        self.sell_at(quantity, close, at)
    }

    fn sell_at(&mut self, quantity: f64, price: f64, at: DateTime<Utc>) -> Trade {
        let value = quantity * price;
        Trade {
            id: self.ids.next_id(),
            side: TradeSide::Sell,
            quantity,
            price,
            value,
            fee: value * self.fee_rate_pct / 100.0,
            executed_at: at,
        }
    }
}
