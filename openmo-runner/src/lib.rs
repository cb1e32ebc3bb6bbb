//! openmo runner: configuration, backtest pipeline, bootstrap simulation.
//!
//! This crate builds on `openmo-core` to provide:
//! - TOML run configuration with content-hashed run ids
//! - CSV loading of intraday bars and daily PnL sequences
//! - The backtest → daily PnL → Monte Carlo bootstrap pipeline
//! - Trade statistics, console reports and artifact export

pub mod bootstrap;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;

pub use bootstrap::{
    run_bootstrap, BootstrapConfig, BootstrapError, BootstrapResult, SimulationRun,
    SimulationSummary,
};
pub use config::{ConfigError, RunConfig, RunId};
pub use data_loader::{load_bars_csv, load_daily_pnl_csv, LoadError};
pub use export::{load_summary, save_artifacts, RunSummary};
pub use metrics::TradeStats;
pub use report::{render_backtest, render_simulation, render_summary};
pub use runner::{
    run_pipeline, run_pipeline_from_csv, run_simulation, PipelineResult, RunError, SCHEMA_VERSION,
};
