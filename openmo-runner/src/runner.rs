//! End-to-end pipeline: bars → session engine → daily PnL → bootstrap.
//!
//! Two entry points:
//! - `run_pipeline()`: takes loaded bars and a validated config. No I/O.
//! - `run_pipeline_from_csv()`: loads bars from a CSV file first. Used by the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use openmo_core::domain::Bar;
use openmo_core::engine::{run_session, EngineError, SessionResult, SimBroker};
use openmo_core::DailyPnl;

use crate::bootstrap::{run_bootstrap, BootstrapConfig, BootstrapError, BootstrapResult};
use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{load_bars_csv, LoadError};
use crate::metrics::TradeStats;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("simulation error: {0}")]
    Simulation(#[from] BootstrapError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one backtest plus its bootstrap simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: RunConfig,
    pub session: SessionResult,
    pub stats: TradeStats,
    /// `None` when the backtest closed no trades, leaving nothing to resample.
    pub simulation: Option<BootstrapResult>,
}

/// Run the backtest and the simulation over already-loaded bars.
pub fn run_pipeline(bars: &[Bar], config: &RunConfig) -> Result<PipelineResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    info!(run_id = %run_id, bars = bars.len(), "starting backtest");

    let mut broker = SimBroker::new(config.broker.clone(), config.strategy.point_value);
    let session = run_session(bars, &config.engine_config(), &mut broker)?;
    let stats = TradeStats::compute(&session.trades, &session.daily, session.starting_equity);
    info!(
        trades = stats.total_trades,
        net_pnl = stats.net_pnl,
        trading_days = stats.trading_days,
        halted_days = session.halt_count(),
        "backtest complete"
    );

    let simulation = if session.daily.is_empty() {
        warn!("no closed trades, skipping bootstrap simulation");
        None
    } else {
        Some(run_simulation(&session.daily, &config.simulation)?)
    };

    Ok(PipelineResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        session,
        stats,
        simulation,
    })
}

/// Load bars from `path`, then run the pipeline.
pub fn run_pipeline_from_csv(path: &Path, config: &RunConfig) -> Result<PipelineResult, RunError> {
    let bars = load_bars_csv(path)?;
    run_pipeline(&bars, config)
}

/// Bootstrap a daily PnL sequence on its own.
pub fn run_simulation(
    daily: &DailyPnl,
    config: &BootstrapConfig,
) -> Result<BootstrapResult, RunError> {
    Ok(run_bootstrap(&daily.values(), config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn bars_for_day(date: &str, drift: f64) -> Vec<Bar> {
        let open = DateTime::parse_from_rfc3339(&format!("{date}T09:30:00-05:00")).unwrap();
        (0..78)
            .map(|i| {
                let o = 5000.0 + drift * i as f64;
                let c = o + drift;
                Bar {
                    timestamp: open + Duration::minutes(5 * i),
                    open: o,
                    high: o.max(c) + 0.5,
                    low: o.min(c) - 0.5,
                    close: c,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    fn small_config() -> RunConfig {
        let mut config = RunConfig::default();
        config.simulation.num_trials = 50;
        config.simulation.parallel = false;
        config
    }

    #[test]
    fn pipeline_runs_backtest_and_simulation() {
        let mut bars = bars_for_day("2024-03-04", 0.5);
        bars.extend(bars_for_day("2024-03-05", 0.5));
        bars.extend(bars_for_day("2024-03-06", -0.5));

        let result = run_pipeline(&bars, &small_config()).unwrap();
        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert!(!result.session.trades.is_empty());
        assert_eq!(result.stats.total_trades, result.session.trades.len());

        let sim = result.simulation.unwrap();
        assert_eq!(sim.runs.len(), 50);
        assert_eq!(sim.summary.days_per_trial, result.session.daily.len());
    }

    #[test]
    fn no_trades_means_no_simulation() {
        // One day only: indicators are still warming up at the entry bar.
        let bars = bars_for_day("2024-03-04", 0.5);
        let result = run_pipeline(&bars, &small_config()).unwrap();
        assert!(result.session.trades.is_empty());
        assert!(result.simulation.is_none());
    }

    #[test]
    fn largest_seed_runs_end_to_end() {
        let mut bars = bars_for_day("2024-03-04", 0.5);
        bars.extend(bars_for_day("2024-03-05", 0.5));
        let mut config = small_config();
        config.simulation.seed = u64::MAX;

        let result = run_pipeline(&bars, &config).unwrap();
        assert_eq!(result.run_id, config.run_id().unwrap());
        assert!(result.simulation.is_some());
    }

    #[test]
    fn invalid_config_fails_before_work() {
        let mut config = small_config();
        config.simulation.num_trials = 0;
        assert!(matches!(
            run_pipeline(&[], &config),
            Err(RunError::Config(ConfigError::Simulation(BootstrapError::ZeroTrials)))
        ));
    }

    #[test]
    fn standalone_simulation_rejects_empty_sequence() {
        assert!(matches!(
            run_simulation(&DailyPnl::default(), &BootstrapConfig::default()),
            Err(RunError::Simulation(BootstrapError::EmptySequence))
        ));
    }
}
