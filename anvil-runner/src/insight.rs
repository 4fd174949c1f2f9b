//! Plain-language insights derived from a result's metrics.

use crate::analytics::PerformanceMetrics;

/// Threshold-based observations about a completed run.
///
/// The thresholds are deliberately coarse; the goal is a quick read of a
/// result, not investment advice.
pub fn insights(metrics: &PerformanceMetrics) -> Vec<String> {
    let mut out = Vec::new();

    if metrics.total_return_pct > 0.0 {
        out.push(format!(
            "Strategy is profitable: {:.2}% total return",
            metrics.total_return_pct
        ));
    } else if metrics.total_return_pct < 0.0 {
        out.push(format!(
            "Strategy lost money: {:.2}% total return",
            metrics.total_return_pct
        ));
    } else {
        out.push("Strategy broke even".to_string());
    }

    if metrics.sharpe_ratio > 1.0 {
        out.push(format!(
            "Good risk-adjusted performance (Sharpe {:.2})",
            metrics.sharpe_ratio
        ));
    } else if metrics.sharpe_ratio < 0.0 {
        out.push(format!(
            "Negative risk-adjusted performance (Sharpe {:.2})",
            metrics.sharpe_ratio
        ));
    }

    if metrics.max_drawdown_pct > 20.0 {
        out.push(format!(
            "High drawdown risk: {:.1}% maximum drawdown",
            metrics.max_drawdown_pct
        ));
    }

    if metrics.win_rate_pct > 50.0 {
        out.push(format!(
            "Wins more often than it loses ({:.1}% win rate)",
            metrics.win_rate_pct
        ));
    }

    if metrics.profit_factor > 1.5 {
        out.push(format!(
            "Healthy profit factor of {:.2}",
            metrics.profit_factor
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profitable_high_sharpe_run() {
        let metrics = PerformanceMetrics {
            total_return_pct: 24.0,
            sharpe_ratio: 1.8,
            max_drawdown_pct: 8.0,
            win_rate_pct: 58.0,
            profit_factor: 2.1,
            ..Default::default()
        };
        let out = insights(&metrics);
        assert!(out.iter().any(|s| s.contains("profitable")));
        assert!(out.iter().any(|s| s.contains("Sharpe 1.80")));
        assert!(out.iter().any(|s| s.contains("win rate")));
        assert!(out.iter().any(|s| s.contains("profit factor")));
        assert!(!out.iter().any(|s| s.contains("drawdown risk")));
    }

    #[test]
    fn losing_run_flags_risk() {
        let metrics = PerformanceMetrics {
            total_return_pct: -12.0,
            sharpe_ratio: -0.5,
            max_drawdown_pct: 35.0,
            ..Default::default()
        };
        let out = insights(&metrics);
        assert!(out.iter().any(|s| s.contains("lost money")));
        assert!(out.iter().any(|s| s.contains("Negative risk-adjusted")));
        assert!(out.iter().any(|s| s.contains("High drawdown risk")));
    }

    #[test]
    fn zero_metrics_break_even_only() {
        let out = insights(&PerformanceMetrics::default());
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("broke even"));
    }
}
