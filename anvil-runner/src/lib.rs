//! Orchestration layer for the anvil backtest engine.
//!
//! Wires strategy sources, price data, the simulation core, performance
//! analytics, and an append-only result store behind a single
//! [`runner::BacktestRunner`]. Data sources and the store sit behind the
//! trait seams in [`ports`], so tests and the CLI swap adapters freely.

pub mod analytics;
pub mod batch;
pub mod config;
pub mod data_loader;
pub mod insight;
pub mod ports;
pub mod result;
pub mod runner;
pub mod store;

pub use batch::run_batch;
pub use config::RunConfig;
pub use data_loader::{CsvPriceService, JsonStrategyFile, SyntheticPriceService};
pub use ports::{
    DataError, PriceDataService, ResultRepository, RunHooks, StoreError, StrategyRepository,
};
pub use result::{BacktestResult, BacktestSummary, RunStatus};
pub use runner::{BacktestRunner, RunError};
pub use store::JsonlResultStore;
