//! Bootstrap equity simulation over a daily PnL sequence.
//!
//! Each trial draws `len(sequence)` daily PnL values uniformly with
//! replacement, walks a starting balance forward through them and records the
//! final equity and the worst peak-to-trough drawdown along the way.
//!
//! Key design choices:
//! - Every trial owns an RNG derived from the master seed and its index, so
//!   results do not depend on thread count or scheduling.
//! - Drawdown peak starts at the starting equity; drawdown is reported in percent.
//! - Ruin is a final equity strictly below `ruin_fraction × starting_equity`.
//! - Malformed input fails the whole run; trials themselves cannot fail.

use openmo_core::rng::{TrialSeeder, BOOTSTRAP_STREAM};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Bins used for the final-equity and drawdown histograms.
pub const HISTOGRAM_BINS: usize = 10;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of independent trials (default 1000).
    pub num_trials: usize,
    /// Balance every trial starts from (default 5000).
    pub starting_equity: f64,
    /// Ruin threshold as a fraction of starting equity, in (0, 1] (default 0.5).
    pub ruin_fraction: f64,
    /// Master RNG seed.
    pub seed: u64,
    /// Keep each trial's full equity path.
    pub keep_paths: bool,
    /// Spread trials over the rayon pool.
    pub parallel: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            num_trials: 1000,
            starting_equity: 5000.0,
            ruin_fraction: 0.5,
            seed: 42,
            keep_paths: true,
            parallel: true,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.num_trials == 0 {
            return Err(BootstrapError::ZeroTrials);
        }
        if !(self.starting_equity > 0.0 && self.starting_equity.is_finite()) {
            return Err(BootstrapError::NonPositiveStartingEquity(self.starting_equity));
        }
        if !(self.ruin_fraction > 0.0 && self.ruin_fraction <= 1.0) {
            return Err(BootstrapError::InvalidRuinFraction(self.ruin_fraction));
        }
        Ok(())
    }

    pub fn ruin_threshold(&self) -> f64 {
        self.ruin_fraction * self.starting_equity
    }
}

// ─── Result types ────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum BootstrapError {
    #[error("daily PnL sequence is empty")]
    EmptySequence,
    #[error("number of trials must be at least 1")]
    ZeroTrials,
    #[error("starting equity must be positive, got {0}")]
    NonPositiveStartingEquity(f64),
    #[error("ruin fraction must be in (0, 1], got {0}")]
    InvalidRuinFraction(f64),
    #[error("daily PnL value at index {index} is not finite")]
    NonFiniteValue { index: usize },
}

/// One Monte Carlo trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub final_equity: f64,
    /// Largest peak-to-trough decline, in percent of the peak.
    pub max_drawdown_pct: f64,
    /// Starting equity followed by one value per drawn day.
    pub equity_path: Option<Vec<f64>>,
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Aggregate statistics over all trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub num_trials: usize,
    pub days_per_trial: usize,
    pub starting_equity: f64,
    pub mean_final_equity: f64,
    pub min_final_equity: f64,
    pub max_final_equity: f64,
    pub mean_net_profit: f64,
    pub mean_max_drawdown_pct: f64,
    /// 95th percentile of the max-drawdown distribution.
    pub drawdown_p95_pct: f64,
    pub ruin_threshold: f64,
    /// Fraction of trials ending strictly below the ruin threshold, in [0, 1].
    pub ruin_probability: f64,
    /// Element-wise mean of the kept equity paths.
    pub mean_curve: Option<Vec<f64>>,
    pub final_equity_histogram: Histogram,
    pub drawdown_histogram: Histogram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub runs: Vec<SimulationRun>,
    pub summary: SimulationSummary,
}

// ─── Simulation ──────────────────────────────────────────────────────

/// Run the bootstrap over `daily_pnl`.
pub fn run_bootstrap(
    daily_pnl: &[f64],
    config: &BootstrapConfig,
) -> Result<BootstrapResult, BootstrapError> {
    config.validate()?;
    if daily_pnl.is_empty() {
        return Err(BootstrapError::EmptySequence);
    }
    if let Some(index) = daily_pnl.iter().position(|v| !v.is_finite()) {
        return Err(BootstrapError::NonFiniteValue { index });
    }

    info!(
        trials = config.num_trials,
        days = daily_pnl.len(),
        starting_equity = config.starting_equity,
        "running bootstrap simulation"
    );

    let seeder = TrialSeeder::new(config.seed);
    let trial = |index: usize| {
        let mut rng = seeder.rng_for(BOOTSTRAP_STREAM, index as u64);
        simulate_trial(daily_pnl, config.starting_equity, config.keep_paths, &mut rng)
    };

    let runs: Vec<SimulationRun> = if config.parallel {
        (0..config.num_trials).into_par_iter().map(trial).collect()
    } else {
        (0..config.num_trials).map(trial).collect()
    };

    let summary = summarize(&runs, daily_pnl.len(), config);
    info!(
        mean_final_equity = summary.mean_final_equity,
        drawdown_p95_pct = summary.drawdown_p95_pct,
        ruin_probability = summary.ruin_probability,
        "bootstrap complete"
    );

    Ok(BootstrapResult { runs, summary })
}

/// Resample the sequence once and walk equity through it.
pub fn simulate_trial<R: Rng + ?Sized>(
    daily_pnl: &[f64],
    starting_equity: f64,
    keep_path: bool,
    rng: &mut R,
) -> SimulationRun {
    let n = daily_pnl.len();
    let mut path = keep_path.then(|| {
        let mut p = Vec::with_capacity(n + 1);
        p.push(starting_equity);
        p
    });

    let mut equity = starting_equity;
    let mut tracker = DrawdownWalk::new(starting_equity);
    for _ in 0..n {
        equity += daily_pnl[rng.gen_range(0..n)];
        tracker.observe(equity);
        if let Some(p) = path.as_mut() {
            p.push(equity);
        }
    }

    SimulationRun {
        final_equity: equity,
        max_drawdown_pct: tracker.max_drawdown * 100.0,
        equity_path: path,
    }
}

/// Running peak and worst drawdown fraction of an equity walk.
#[derive(Debug, Clone, Copy)]
pub struct DrawdownWalk {
    peak: f64,
    max_drawdown: f64,
}

impl DrawdownWalk {
    pub fn new(start: f64) -> Self {
        Self {
            peak: start,
            max_drawdown: 0.0,
        }
    }

    pub fn observe(&mut self, equity: f64) {
        if equity > self.peak {
            self.peak = equity;
        }
        if self.peak > 0.0 {
            let dd = (self.peak - equity) / self.peak;
            if dd > self.max_drawdown {
                self.max_drawdown = dd;
            }
        }
    }

    /// Worst drawdown seen so far, as a fraction of the peak.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }
}

/// Max drawdown (percent) of a complete equity path whose first value is the start.
pub fn path_max_drawdown_pct(path: &[f64]) -> f64 {
    let Some(&start) = path.first() else {
        return 0.0;
    };
    let mut walk = DrawdownWalk::new(start);
    for &equity in &path[1..] {
        walk.observe(equity);
    }
    walk.max_drawdown() * 100.0
}

// ─── Statistics ──────────────────────────────────────────────────────

fn summarize(runs: &[SimulationRun], days: usize, config: &BootstrapConfig) -> SimulationSummary {
    let n = runs.len() as f64;
    let finals: Vec<f64> = runs.iter().map(|r| r.final_equity).collect();
    let drawdowns: Vec<f64> = runs.iter().map(|r| r.max_drawdown_pct).collect();

    let mean_final_equity = finals.iter().sum::<f64>() / n;
    let min_final_equity = finals.iter().copied().fold(f64::INFINITY, f64::min);
    let max_final_equity = finals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted_dd = drawdowns.clone();
    sorted_dd.sort_by(f64::total_cmp);

    let ruin_threshold = config.ruin_threshold();
    let ruined = finals.iter().filter(|&&f| f < ruin_threshold).count();

    SimulationSummary {
        num_trials: runs.len(),
        days_per_trial: days,
        starting_equity: config.starting_equity,
        mean_final_equity,
        min_final_equity,
        max_final_equity,
        mean_net_profit: mean_final_equity - config.starting_equity,
        mean_max_drawdown_pct: drawdowns.iter().sum::<f64>() / n,
        drawdown_p95_pct: percentile_sorted(&sorted_dd, 95.0),
        ruin_threshold,
        ruin_probability: ruined as f64 / n,
        mean_curve: mean_curve(runs),
        final_equity_histogram: histogram(&finals, HISTOGRAM_BINS),
        drawdown_histogram: histogram(&drawdowns, HISTOGRAM_BINS),
    }
}

/// Element-wise mean of all kept paths. `None` when paths were not kept.
pub fn mean_curve(runs: &[SimulationRun]) -> Option<Vec<f64>> {
    let paths: Vec<&Vec<f64>> = runs.iter().filter_map(|r| r.equity_path.as_ref()).collect();
    let len = paths.first()?.len();
    let mut mean = vec![0.0; len];
    for path in &paths {
        for (m, v) in mean.iter_mut().zip(path.iter()) {
            *m += v;
        }
    }
    let count = paths.len() as f64;
    mean.iter_mut().for_each(|m| *m /= count);
    Some(mean)
}

/// Equal-width histogram over `[min, max]`; the maximum lands in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    if values.is_empty() {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let slot = (((v - lo) / width) as usize).min(bins - 1);
        counts[slot] += 1;
    }
    Histogram { edges, counts }
}

/// Percentile of a sorted slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
