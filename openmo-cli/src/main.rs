//! openmo CLI: opening-momentum backtests and bootstrap simulations.
//!
//! Commands:
//! - `backtest`: run the strategy over a bar CSV, then bootstrap its daily PnL
//! - `simulate`: bootstrap an existing `date,pnl` CSV
//! - `config`: print the default TOML configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use openmo_runner::{
    load_daily_pnl_csv, render_simulation, render_summary,
    run_pipeline_from_csv, run_simulation, save_artifacts, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "openmo",
    about = "Opening-momentum intraday backtester with Monte Carlo bootstrap"
)]
struct Cli {
    /// Log session events (entries, reversals, halts) at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a bar CSV and bootstrap the resulting daily PnL.
    Backtest {
        /// Bars: timestamp,open,high,low,close,volume (RFC 3339 timestamps).
        #[arg(long)]
        bars: PathBuf,

        /// TOML config file. Defaults apply to anything it omits.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of bootstrap trials.
        #[arg(long)]
        trials: Option<usize>,

        /// Override the bootstrap seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the report without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_export: bool,
    },
    /// Bootstrap a daily PnL CSV (date,pnl) without running a backtest.
    Simulate {
        #[arg(long)]
        daily_pnl: PathBuf,

        /// TOML config file; only its [simulation] table is used.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        trials: Option<usize>,

        #[arg(long)]
        starting_equity: Option<f64>,

        /// Ruin threshold as a fraction of starting equity.
        #[arg(long)]
        ruin_fraction: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Backtest {
            bars,
            config,
            trials,
            seed,
            output_dir,
            no_export,
        } => run_backtest_cmd(&bars, config.as_deref(), trials, seed, &output_dir, no_export),
        Commands::Simulate {
            daily_pnl,
            config,
            trials,
            starting_equity,
            ruin_fraction,
            seed,
        } => {
            let mut run_config = load_config(config.as_deref())?;
            let sim = &mut run_config.simulation;
            if let Some(n) = trials {
                sim.num_trials = n;
            }
            if let Some(eq) = starting_equity {
                sim.starting_equity = eq;
            }
            if let Some(f) = ruin_fraction {
                sim.ruin_fraction = f;
            }
            if let Some(s) = seed {
                sim.seed = s;
            }
            run_simulate_cmd(&daily_pnl, &run_config)
        }
        Commands::Config => {
            print!("{}", RunConfig::default().to_toml()?);
            Ok(())
        }
    }
}

/// Logs go to stderr so the report on stdout stays clean. RUST_LOG wins.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "openmo_core=debug,openmo_runner=debug"
    } else {
        "openmo_core=info,openmo_runner=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_backtest_cmd(
    bars: &Path,
    config_path: Option<&Path>,
    trials: Option<usize>,
    seed: Option<u64>,
    output_dir: &Path,
    no_export: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    info!(bars = %bars.display(), "backtest requested");
    if let Some(n) = trials {
        config.simulation.num_trials = n;
    }
    if let Some(s) = seed {
        config.simulation.seed = s;
    }

    let result = run_pipeline_from_csv(bars, &config)
        .with_context(|| format!("backtest over {} failed", bars.display()))?;

    print!("{}", render_summary(&result));

    if !no_export {
        let run_dir = save_artifacts(&result, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_simulate_cmd(daily_pnl: &Path, config: &RunConfig) -> Result<()> {
    let daily = load_daily_pnl_csv(daily_pnl)?;
    println!("Total Trading Days: {}", daily.len());
    let result = run_simulation(&daily, &config.simulation)
        .with_context(|| format!("simulation over {} failed", daily_pnl.display()))?;
    print!("{}", render_simulation(&result.summary));
    Ok(())
}
