//! Signal evaluation — pure functions over precomputed indicator series.
//!
//! Evaluation never sees portfolio state. The one position fact an exit
//! rule needs, the entry price, is passed in explicitly, which keeps the
//! evaluator trivially testable and deterministic: identical inputs always
//! produce identical booleans.

use crate::domain::strategy::{CompareOp, ConditionTree, Operand, RiskPolicy};
use crate::indicators::IndicatorSet;

/// Evaluate an entry condition tree at candle `i`.
pub fn entry_signal(tree: &ConditionTree, set: &IndicatorSet, i: usize) -> bool {
    eval(tree, set, i)
}

/// Evaluate an exit at candle `i` for a position opened at `entry_price`.
///
/// Stop-loss and take-profit short-circuit the condition tree: a breached
/// risk limit exits regardless of what the indicators say. Limits set to
/// zero or below are disabled.
pub fn exit_signal(
    tree: &ConditionTree,
    set: &IndicatorSet,
    i: usize,
    close: f64,
    entry_price: f64,
    risk: &RiskPolicy,
) -> bool {
    if entry_price > 0.0 {
        let move_pct = (close - entry_price) / entry_price * 100.0;
        if risk.stop_loss_pct > 0.0 && move_pct <= -risk.stop_loss_pct {
            return true;
        }
        if risk.take_profit_pct > 0.0 && move_pct >= risk.take_profit_pct {
            return true;
        }
    }
    eval(tree, set, i)
}

fn eval(tree: &ConditionTree, set: &IndicatorSet, i: usize) -> bool {
    match tree {
        ConditionTree::All { conditions } => conditions.iter().all(|c| eval(c, set, i)),
        ConditionTree::Any { conditions } => conditions.iter().any(|c| eval(c, set, i)),
        ConditionTree::Compare { left, op, right } => {
            let l = set.value(left, i);
            let r = operand_value(right, set, i);
            match op {
                // NaN on either side makes these comparisons false
                CompareOp::Gt => l > r,
                CompareOp::Lt => l < r,
                CompareOp::Crossover => {
                    if i == 0 {
                        return false;
                    }
                    let pl = set.value(left, i - 1);
                    let pr = operand_value(right, set, i - 1);
                    pl <= pr && l > r
                }
                CompareOp::Crossunder => {
                    if i == 0 {
                        return false;
                    }
                    let pl = set.value(left, i - 1);
                    let pr = operand_value(right, set, i - 1);
                    pl >= pr && l < r
                }
            }
        }
    }
}

fn operand_value(operand: &Operand, set: &IndicatorSet, i: usize) -> f64 {
    match operand {
        Operand::Value(v) => *v,
        Operand::Indicator(r) => set.value(r, i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::{IndicatorKind, IndicatorRef};
    use crate::domain::Candle;
    use crate::indicators::IndicatorSet;
    use chrono::{TimeZone, Utc};

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0,
            })
            .collect()
    }

    fn close_ref() -> IndicatorRef {
        IndicatorRef {
            kind: IndicatorKind::Close,
            period: 0,
        }
    }

    fn compare(left: IndicatorRef, op: CompareOp, right: Operand) -> ConditionTree {
        ConditionTree::Compare { left, op, right }
    }

    // ── Leaf comparisons ──

    #[test]
    fn gt_and_lt_against_threshold() {
        let candles = candles_from_closes(&[100.0, 110.0]);
        let tree_gt = compare(close_ref(), CompareOp::Gt, Operand::Value(105.0));
        let tree_lt = compare(close_ref(), CompareOp::Lt, Operand::Value(105.0));
        let set = IndicatorSet::compute(&candles, &[&tree_gt, &tree_lt]);

        assert!(!entry_signal(&tree_gt, &set, 0));
        assert!(entry_signal(&tree_gt, &set, 1));
        assert!(entry_signal(&tree_lt, &set, 0));
        assert!(!entry_signal(&tree_lt, &set, 1));
    }

    #[test]
    fn nan_reading_is_false() {
        // SMA(5) is NaN on the first four candles
        let candles = candles_from_closes(&[100.0, 100.0, 100.0]);
        let tree = compare(
            IndicatorRef {
                kind: IndicatorKind::Sma,
                period: 5,
            },
            CompareOp::Gt,
            Operand::Value(-1e9),
        );
        let set = IndicatorSet::compute(&candles, &[&tree]);
        assert!(!entry_signal(&tree, &set, 2));
    }

    // ── Crossovers ──

    #[test]
    fn crossover_fires_only_on_crossing_candle() {
        let candles = candles_from_closes(&[100.0, 104.0, 110.0, 112.0]);
        let tree = compare(close_ref(), CompareOp::Crossover, Operand::Value(105.0));
        let set = IndicatorSet::compute(&candles, &[&tree]);

        assert!(!entry_signal(&tree, &set, 0)); // no previous candle
        assert!(!entry_signal(&tree, &set, 1)); // still below
        assert!(entry_signal(&tree, &set, 2)); // 104 <= 105 && 110 > 105
        assert!(!entry_signal(&tree, &set, 3)); // already above
    }

    #[test]
    fn crossunder_fires_only_on_crossing_candle() {
        let candles = candles_from_closes(&[110.0, 106.0, 100.0, 98.0]);
        let tree = compare(close_ref(), CompareOp::Crossunder, Operand::Value(105.0));
        let set = IndicatorSet::compute(&candles, &[&tree]);

        assert!(!entry_signal(&tree, &set, 1));
        assert!(entry_signal(&tree, &set, 2));
        assert!(!entry_signal(&tree, &set, 3));
    }

    #[test]
    fn crossover_touch_then_break_counts() {
        // prev equal, current above: <= allows the touch
        let candles = candles_from_closes(&[105.0, 106.0]);
        let tree = compare(close_ref(), CompareOp::Crossover, Operand::Value(105.0));
        let set = IndicatorSet::compute(&candles, &[&tree]);
        assert!(entry_signal(&tree, &set, 1));
    }

    #[test]
    fn indicator_vs_indicator_crossover() {
        // Fast SMA(2) crosses above slow SMA(4) when the series turns up
        let candles = candles_from_closes(&[110.0, 105.0, 100.0, 95.0, 120.0, 130.0]);
        let tree = compare(
            IndicatorRef {
                kind: IndicatorKind::Sma,
                period: 2,
            },
            CompareOp::Crossover,
            Operand::Indicator(IndicatorRef {
                kind: IndicatorKind::Sma,
                period: 4,
            }),
        );
        let set = IndicatorSet::compute(&candles, &[&tree]);
        let fired: Vec<usize> = (0..6).filter(|&i| entry_signal(&tree, &set, i)).collect();
        assert_eq!(fired, vec![4]);
    }

    // ── Combinators ──

    #[test]
    fn all_requires_every_condition() {
        let candles = candles_from_closes(&[100.0, 110.0]);
        let tree = ConditionTree::All {
            conditions: vec![
                compare(close_ref(), CompareOp::Gt, Operand::Value(105.0)),
                compare(close_ref(), CompareOp::Lt, Operand::Value(108.0)),
            ],
        };
        let set = IndicatorSet::compute(&candles, &[&tree]);
        assert!(!entry_signal(&tree, &set, 0)); // first true, second true... close=100: Gt false
        assert!(!entry_signal(&tree, &set, 1)); // close=110: Lt false
    }

    #[test]
    fn any_requires_one_condition() {
        let candles = candles_from_closes(&[100.0, 110.0]);
        let tree = ConditionTree::Any {
            conditions: vec![
                compare(close_ref(), CompareOp::Gt, Operand::Value(105.0)),
                compare(close_ref(), CompareOp::Lt, Operand::Value(90.0)),
            ],
        };
        let set = IndicatorSet::compute(&candles, &[&tree]);
        assert!(!entry_signal(&tree, &set, 0));
        assert!(entry_signal(&tree, &set, 1));
    }

    #[test]
    fn empty_all_is_true_empty_any_is_false() {
        let candles = candles_from_closes(&[100.0]);
        let all = ConditionTree::All { conditions: vec![] };
        let any = ConditionTree::Any { conditions: vec![] };
        let set = IndicatorSet::compute(&candles, &[&all, &any]);
        assert!(entry_signal(&all, &set, 0));
        assert!(!entry_signal(&any, &set, 0));
    }

    // ── Risk short-circuit ──

    fn never() -> ConditionTree {
        ConditionTree::Any { conditions: vec![] }
    }

    #[test]
    fn stop_loss_short_circuits_tree() {
        let candles = candles_from_closes(&[100.0]);
        let tree = never();
        let set = IndicatorSet::compute(&candles, &[&tree]);
        let risk = RiskPolicy {
            stop_loss_pct: 5.0,
            take_profit_pct: 0.0,
            max_capital_usage_pct: 100.0,
        };
        // Down 5% from entry 100 → exit even though the tree never fires
        assert!(exit_signal(&tree, &set, 0, 95.0, 100.0, &risk));
        assert!(!exit_signal(&tree, &set, 0, 96.0, 100.0, &risk));
    }

    #[test]
    fn take_profit_short_circuits_tree() {
        let candles = candles_from_closes(&[100.0]);
        let tree = never();
        let set = IndicatorSet::compute(&candles, &[&tree]);
        let risk = RiskPolicy {
            stop_loss_pct: 0.0,
            take_profit_pct: 10.0,
            max_capital_usage_pct: 100.0,
        };
        assert!(exit_signal(&tree, &set, 0, 110.0, 100.0, &risk));
        assert!(!exit_signal(&tree, &set, 0, 109.0, 100.0, &risk));
    }

    #[test]
    fn disabled_limits_defer_to_tree() {
        let candles = candles_from_closes(&[50.0]);
        let tree = compare(close_ref(), CompareOp::Lt, Operand::Value(60.0));
        let set = IndicatorSet::compute(&candles, &[&tree]);
        let risk = RiskPolicy::default(); // both limits disabled
        assert!(exit_signal(&tree, &set, 0, 50.0, 100.0, &risk));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let candles = candles_from_closes(&[100.0, 101.0, 99.0, 104.0]);
        let tree = compare(close_ref(), CompareOp::Crossover, Operand::Value(102.0));
        let set = IndicatorSet::compute(&candles, &[&tree]);
        for i in 0..4 {
            assert_eq!(entry_signal(&tree, &set, i), entry_signal(&tree, &set, i));
        }
    }
}
