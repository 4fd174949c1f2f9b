//! Parallel execution of independent backtest runs.

use rayon::prelude::*;
use tracing::info;

use crate::config::RunConfig;
use crate::ports::RunHooks;
use crate::result::BacktestResult;
use crate::runner::BacktestRunner;

/// Run every config on the rayon pool, one independent run per entry.
///
/// Results come back in input order. Each run gets default (silent)
/// hooks; per-run progress does not compose across a parallel batch, so
/// callers wanting feedback should drive runs individually.
pub fn run_batch(runner: &BacktestRunner, configs: &[RunConfig]) -> Vec<BacktestResult> {
    info!(runs = configs.len(), "starting batch");
    configs
        .par_iter()
        .map(|config| runner.run_backtest(config, &RunHooks::default()))
        .collect()
}
