//! Domain types: candles, strategies, positions, trades, equity points.

pub mod candle;
pub mod equity;
pub mod position;
pub mod strategy;
pub mod trade;

pub use candle::{Candle, Timeframe};
pub use equity::EquityPoint;
pub use position::Position;
pub use strategy::{
    CompareOp, ConditionTree, IndicatorKind, IndicatorRef, Operand, RiskPolicy, SizingPolicy,
    Strategy,
};
pub use trade::{RoundTrip, Trade, TradeSide};
