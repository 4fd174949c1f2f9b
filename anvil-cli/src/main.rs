//! Anvil CLI — run, analyze, and compare strategy backtests.
//!
//! Commands:
//! - `run` — execute one or more backtests from TOML run configs
//! - `analyze` — print threshold insights for a stored result
//! - `recent` — list the most recent stored results
//! - `compare` — print stored results side by side

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anvil_runner::batch::run_batch;
use anvil_runner::insight::insights;
use anvil_runner::{
    BacktestResult, BacktestRunner, BacktestSummary, CsvPriceService, JsonStrategyFile,
    JsonlResultStore, PriceDataService, RunConfig, RunHooks, RunStatus, SyntheticPriceService,
};

#[derive(Parser)]
#[command(name = "anvil", about = "Anvil — candle-by-candle strategy backtesting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute backtests from TOML run configs.
    Run {
        /// Run config files. More than one runs as a parallel batch.
        #[arg(required = true)]
        configs: Vec<PathBuf>,

        /// JSON file holding the strategy documents.
        #[arg(long, default_value = "strategies.json")]
        strategies: PathBuf,

        /// Directory of {symbol}.csv candle files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Generate deterministic synthetic candles instead of reading CSV.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// JSONL file results are appended to.
        #[arg(long, default_value = "results.jsonl")]
        results: PathBuf,
    },
    /// Print threshold insights for a stored result.
    Analyze {
        /// Result ID, as printed by `run` and `recent`.
        id: String,

        #[arg(long, default_value = "results.jsonl")]
        results: PathBuf,
    },
    /// List the most recent stored results.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long, default_value = "results.jsonl")]
        results: PathBuf,
    },
    /// Print stored results side by side.
    Compare {
        /// Result IDs to compare.
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long, default_value = "results.jsonl")]
        results: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            configs,
            strategies,
            data_dir,
            synthetic,
            seed,
            results,
        } => run_cmd(configs, strategies, data_dir, synthetic, seed, results),
        Commands::Analyze { id, results } => analyze_cmd(&id, results),
        Commands::Recent { limit, results } => recent_cmd(limit, results),
        Commands::Compare { ids, results } => compare_cmd(&ids, results),
    }
}

fn run_cmd(
    config_paths: Vec<PathBuf>,
    strategies: PathBuf,
    data_dir: Option<PathBuf>,
    synthetic: bool,
    seed: u64,
    results: PathBuf,
) -> Result<()> {
    if data_dir.is_some() && synthetic {
        bail!("--data-dir and --synthetic are mutually exclusive");
    }
    let prices: Arc<dyn PriceDataService> = match data_dir {
        Some(dir) => Arc::new(CsvPriceService::new(dir)),
        None if synthetic => Arc::new(SyntheticPriceService::new(seed)),
        None => bail!("one of --data-dir or --synthetic is required"),
    };

    let runner = BacktestRunner::new(
        Arc::new(JsonStrategyFile::load(&strategies)?),
        prices,
        Arc::new(JsonlResultStore::new(results)),
    );

    let configs: Vec<RunConfig> = config_paths
        .iter()
        .map(|p| RunConfig::from_file(p))
        .collect::<Result<_, _>>()?;

    if configs.len() == 1 {
        let hooks = RunHooks {
            on_progress: Some(Box::new(|pct, stage| {
                eprintln!("  {pct:>3}%  {stage}");
            })),
            ..Default::default()
        };
        let result = runner.run_backtest(&configs[0], &hooks);
        print_summary(&result);
        print_insights(&result);
        exit_on_failure(&[result]);
    } else {
        let batch = run_batch(&runner, &configs);
        for result in &batch {
            print_summary(result);
        }
        println!(
            "Batch done: {} completed, {} failed",
            batch
                .iter()
                .filter(|r| r.status == RunStatus::Completed)
                .count(),
            batch.iter().filter(|r| r.status == RunStatus::Failed).count(),
        );
        exit_on_failure(&batch);
    }

    Ok(())
}

fn exit_on_failure(results: &[BacktestResult]) {
    if results.iter().any(|r| r.status == RunStatus::Failed) {
        std::process::exit(1);
    }
}

fn analyze_cmd(id: &str, results: PathBuf) -> Result<()> {
    let runner = query_runner(results);
    for line in runner.analyze_result(id)? {
        println!("- {line}");
    }
    Ok(())
}

fn recent_cmd(limit: usize, results: PathBuf) -> Result<()> {
    let runner = query_runner(results);
    let rows = runner.recent_results(limit)?;
    if rows.is_empty() {
        println!("No stored results.");
        return Ok(());
    }
    print_summary_table(&rows);
    Ok(())
}

fn compare_cmd(ids: &[String], results: PathBuf) -> Result<()> {
    let runner = query_runner(results);
    let rows = runner.compare_strategies(ids)?;
    print_summary_table(&rows);
    Ok(())
}

/// Runner for the query commands; strategies and prices are never touched.
fn query_runner(results: PathBuf) -> BacktestRunner {
    BacktestRunner::new(
        Arc::new(JsonStrategyFile::from_strategies(Vec::new())),
        Arc::new(SyntheticPriceService::new(0)),
        Arc::new(JsonlResultStore::new(results)),
    )
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", result.id);
    println!("Strategy:       {}", result.strategy_id);
    println!("Symbol:         {}", result.symbol);
    println!("Timeframe:      {}", result.timeframe.as_str());
    if result.status == RunStatus::Failed {
        println!("Status:         FAILED");
        if let Some(msg) = &result.error_message {
            println!("Error:          {msg}");
        }
        println!();
        return;
    }
    println!("Trades:         {}", result.metrics.total_trades);
    println!(
        "Capital:        {:.2} -> {:.2} (peak {:.2})",
        result.initial_capital, result.final_capital, result.peak_capital
    );
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", result.metrics.total_return_pct);
    println!("Annualized:     {:.2}%", result.metrics.annualized_return_pct);
    println!("Sharpe:         {:.3}", result.metrics.sharpe_ratio);
    println!("Sortino:        {:.3}", result.metrics.sortino_ratio);
    println!("Calmar:         {:.3}", result.metrics.calmar_ratio);
    println!("Max Drawdown:   {:.2}%", result.metrics.max_drawdown_pct);
    println!("Win Rate:       {:.1}%", result.metrics.win_rate_pct);
    println!("Profit Factor:  {:.2}", result.metrics.profit_factor);
    println!("Expectancy:     {:.2}", result.metrics.expectancy);
    println!("Elapsed:        {} ms", result.execution_time_ms);
    println!();
}

fn print_insights(result: &BacktestResult) {
    if result.status != RunStatus::Completed {
        return;
    }
    println!("--- Insights ---");
    for line in insights(&result.metrics) {
        println!("- {line}");
    }
    println!();
}

fn print_summary_table(rows: &[BacktestSummary]) {
    println!(
        "{:<16} {:<16} {:<10} {:<10} {:>9} {:>8} {:>8} {:>7}",
        "ID", "Strategy", "Symbol", "Status", "Return%", "Sharpe", "MaxDD%", "Trades"
    );
    println!("{}", "-".repeat(90));
    for row in rows {
        let status = match row.status {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        println!(
            "{:<16} {:<16} {:<10} {:<10} {:>9.2} {:>8.3} {:>8.2} {:>7}",
            truncate(&row.id, 16),
            truncate(&row.strategy_id, 16),
            row.symbol,
            status,
            row.total_return_pct,
            row.sharpe_ratio,
            row.max_drawdown_pct,
            row.total_trades,
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max - 1])
    }
}
