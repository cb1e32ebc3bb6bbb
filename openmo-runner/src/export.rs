//! Artifact export: JSON summary plus CSV tapes.
//!
//! A saved run directory holds:
//! - `summary.json`: config, trade stats and simulation summary, schema-versioned
//! - `trades.csv`: the closed-trade tape
//! - `daily_pnl.csv`: the daily sequence, loadable by `simulate`
//! - `simulations.csv`: one row per bootstrap trial
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use openmo_core::domain::{ClosedTrade, ExitReason, ReversalTrigger};
use openmo_core::DailyPnl;

use crate::bootstrap::{SimulationRun, SimulationSummary};
use crate::config::{RunConfig, RunId};
use crate::metrics::TradeStats;
use crate::runner::{PipelineResult, SCHEMA_VERSION};

/// The persisted headline of a run. Excludes per-bar events and trial paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: RunConfig,
    pub stats: TradeStats,
    pub halted_days: usize,
    pub skipped_bars: usize,
    pub final_equity: f64,
    pub simulation: Option<SimulationSummary>,
}

impl RunSummary {
    pub fn from_result(result: &PipelineResult) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            config: result.config.clone(),
            stats: result.stats.clone(),
            halted_days: result.session.halt_count(),
            skipped_bars: result.session.skipped_bars,
            final_equity: result.session.final_equity,
            simulation: result.simulation.as_ref().map(|s| s.summary.clone()),
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize RunSummary to JSON")
}

/// Deserialize a `RunSummary`, rejecting schema versions newer than ours.
pub fn import_summary_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize RunSummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn exit_reason_label(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::Reversal(ReversalTrigger::TrailingStop) => "reversal_trailing_stop",
        ExitReason::Reversal(ReversalTrigger::VolumeSpike) => "reversal_volume_spike",
        ExitReason::SessionClose => "session_close",
        ExitReason::DailyLossLimit => "daily_loss_limit",
        ExitReason::SessionRollover => "session_rollover",
        ExitReason::EndOfData => "end_of_data",
    }
}

/// Columns: direction, size, entry_time, entry_price, exit_time, exit_price,
/// exit_reason, gross_pnl, commission, net_pnl
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "size",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "exit_reason",
        "gross_pnl",
        "commission",
        "net_pnl",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.direction).to_lowercase(),
            &t.size.to_string(),
            &t.entry_timestamp.to_rfc3339(),
            &format!("{:.4}", t.entry_price),
            &t.close_timestamp.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
            &format!("{:.4}", t.exit_price),
            exit_reason_label(t.exit_reason),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, pnl, trade_count. `load_daily_pnl_csv` reads this back.
///
/// PnL is written at full precision so a standalone simulation resamples the
/// exact values the backtest produced.
pub fn export_daily_pnl_csv(daily: &DailyPnl) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "pnl", "trade_count"])?;
    for d in &daily.days {
        wtr.write_record([
            &d.date.to_string(),
            &d.pnl.to_string(),
            &d.trade_count.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: trial, final_equity, max_drawdown_pct
pub fn export_simulations_csv(runs: &[SimulationRun]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trial", "final_equity", "max_drawdown_pct"])?;
    for (i, run) in runs.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &format!("{:.2}", run.final_equity),
            &format!("{:.4}", run.max_drawdown_pct),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one pipeline run.
///
/// Creates `run_{timestamp}_{run_id prefix}/` under `output_dir` and returns
/// its path. `simulations.csv` is written only when a simulation ran.
pub fn save_artifacts(result: &PipelineResult, output_dir: &Path) -> Result<PathBuf> {
    let id_prefix: String = result.run_id.chars().take(12).collect();
    let dirname = format!(
        "run_{}_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        id_prefix
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_summary_json(&RunSummary::from_result(result))?;
    std::fs::write(run_dir.join("summary.json"), &json)?;

    let trades_csv = export_trades_csv(&result.session.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    let daily_csv = export_daily_pnl_csv(&result.session.daily)?;
    std::fs::write(run_dir.join("daily_pnl.csv"), &daily_csv)?;

    if let Some(sim) = &result.simulation {
        let sims_csv = export_simulations_csv(&sim.runs)?;
        std::fs::write(run_dir.join("simulations.csv"), &sims_csv)?;
    }

    Ok(run_dir)
}

/// Load the `RunSummary` from an artifact directory.
pub fn load_summary(dir: &Path) -> Result<RunSummary> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}
