//! Position sizing — how much notional to commit on an entry signal.
//!
//! Responsibilities:
//! - Turn (cash, price, policy, risk limits) into a notional amount.
//!
//! Non-responsibilities:
//! - Whether to enter at all (signals decide).
//! - Fill prices, slippage, fees (execution decides).

use crate::domain::strategy::{RiskPolicy, SizingPolicy};

/// Fraction of cash committed by the default policy.
const DEFAULT_CASH_FRACTION: f64 = 0.10;

/// Notional to commit for one entry. Returns 0.0 when cash or price is
/// non-positive.
///
/// All policies except `FixedPercent` are capped at
/// `cash * max_capital_usage_pct`. `FixedPercent` deliberately bypasses the
/// cap: percent-sized strategies treat their percentage as the capital
/// usage limit, and capping it twice would change every existing strategy's
/// results.
pub fn size_position(cash: f64, price: f64, sizing: &SizingPolicy, risk: &RiskPolicy) -> f64 {
    if cash <= 0.0 || price <= 0.0 {
        return 0.0;
    }
    let cap = cash * risk.max_capital_usage_pct / 100.0;
    match sizing {
        SizingPolicy::FixedAmount { amount } => amount.min(cap),
        SizingPolicy::FixedPercent { percent } => cash * percent / 100.0,
        SizingPolicy::RiskBased { max_risk_percent } => {
            if risk.stop_loss_pct <= 0.0 {
                // No stop-loss to size against: fall back to the default
                return (cash * DEFAULT_CASH_FRACTION).min(cap);
            }
            let risk_amount = cash * max_risk_percent / 100.0;
            (risk_amount / (risk.stop_loss_pct / 100.0)).min(cap)
        }
        SizingPolicy::Default => (cash * DEFAULT_CASH_FRACTION).min(cap),
    }
}
