//! Performance analytics: metrics, drawdown episodes, monthly buckets.

pub mod drawdown;
pub mod metrics;
pub mod monthly;

pub use drawdown::{episodes, DrawdownEpisode};
pub use metrics::PerformanceMetrics;
pub use monthly::{monthly_returns, MonthlyReturn};
