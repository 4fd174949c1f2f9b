//! Strategy — the declarative document the engine executes.
//!
//! A strategy is data, not code: entry and exit are condition trees over
//! indicator readings, sizing and risk are tagged policy enums. The whole
//! document round-trips through serde, which is what makes run IDs
//! content-addressable.

use serde::{Deserialize, Serialize};

/// A complete strategy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    /// Symbols this strategy trades. The runner resolves the first entry;
    /// multi-symbol evaluation is expressed as separate runs.
    #[serde(default)]
    pub symbols: Vec<String>,
    pub entry: ConditionTree,
    pub exit: ConditionTree,
    #[serde(default)]
    pub sizing: SizingPolicy,
    #[serde(default)]
    pub risk: RiskPolicy,
}

/// Boolean combinator tree over indicator comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionTree {
    /// True when every child condition is true. Empty = true.
    All { conditions: Vec<ConditionTree> },
    /// True when at least one child condition is true. Empty = false.
    Any { conditions: Vec<ConditionTree> },
    /// Leaf comparison between an indicator reading and an operand.
    Compare {
        left: IndicatorRef,
        op: CompareOp,
        right: Operand,
    },
}

impl ConditionTree {
    /// Collect every indicator reference the tree mentions, left and right.
    pub fn indicator_refs(&self, out: &mut Vec<IndicatorRef>) {
        match self {
            ConditionTree::All { conditions } | ConditionTree::Any { conditions } => {
                for c in conditions {
                    c.indicator_refs(out);
                }
            }
            ConditionTree::Compare { left, right, .. } => {
                out.push(*left);
                if let Operand::Indicator(r) = right {
                    out.push(*r);
                }
            }
        }
    }
}

/// Comparison operator for a leaf condition.
///
/// `Crossover`/`Crossunder` compare the previous candle's readings against
/// the current candle's, so they fire only on the candle where the lines
/// actually cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Lt,
    Crossover,
    Crossunder,
}

/// Right-hand side of a comparison: a constant threshold or a second
/// indicator series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Value(f64),
    Indicator(IndicatorRef),
}

/// Reference to one precomputed indicator series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IndicatorRef {
    pub kind: IndicatorKind,
    /// Lookback period. Ignored by `MacdLine`/`MacdSignal`/`MacdHistogram`
    /// (fixed 12/26/9) and by the `Close`/`Volume` pseudo-indicators.
    #[serde(default)]
    pub period: usize,
}

/// The indicator menu.
///
/// `Close` and `Volume` expose the raw series so condition trees can compare
/// indicators against price or volume directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    Atr,
    Close,
    Volume,
}

/// How much notional to commit on an entry signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingPolicy {
    /// A fixed notional per entry, capped by max capital usage.
    FixedAmount { amount: f64 },
    /// A fixed fraction of current cash. Not capped by max capital usage.
    FixedPercent { percent: f64 },
    /// Risk a fraction of cash; notional = risk amount / stop-loss fraction,
    /// capped by max capital usage.
    RiskBased { max_risk_percent: f64 },
    /// 10% of current cash, capped by max capital usage.
    Default,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::Default
    }
}

/// Per-position risk limits, all in percent.
///
/// A non-positive stop-loss or take-profit disables that exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    #[serde(default)]
    pub stop_loss_pct: f64,
    #[serde(default)]
    pub take_profit_pct: f64,
    #[serde(default = "default_max_capital_usage")]
    pub max_capital_usage_pct: f64,
}

fn default_max_capital_usage() -> f64 {
    100.0
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            max_capital_usage_pct: 100.0,
        }
    }
}
