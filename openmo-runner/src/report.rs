//! Plain-text console reports for a backtest and its simulation.

use crate::bootstrap::SimulationSummary;
use crate::metrics::TradeStats;
use crate::runner::PipelineResult;

const RULE: &str = "======================================";

/// Backtest block. Prints a single line when no trade closed.
pub fn render_backtest(stats: &TradeStats, halted_days: usize, skipped_bars: usize) -> String {
    let mut out = String::with_capacity(512);
    out.push_str("========== BACKTEST RESULTS ==========\n");
    if stats.total_trades == 0 {
        out.push_str("No trades were closed during this period.\n");
    } else {
        out.push_str(&format!("Total Trades: {}\n", stats.total_trades));
        out.push_str(&format!(
            "Win Rate: {:.2}% ({} Won / {} Lost)\n",
            stats.win_rate, stats.won, stats.lost
        ));
        out.push_str(&format!("Net PnL: ${:.2}\n", stats.net_pnl));
        out.push_str(&format!("Commission: ${:.2}\n", stats.total_commission));
        out.push_str(&format!("Profit Factor: {:.2}\n", stats.profit_factor));
        out.push_str(&format!("Max Drawdown: {:.2}%\n", stats.max_drawdown_pct));
        out.push_str(&format!(
            "Max Drawdown Length: {} days\n",
            stats.max_drawdown_len_days
        ));
        out.push_str(&format!("Trading Days: {}\n", stats.trading_days));
        out.push_str(&format!("Average Daily PnL: ${:.2}\n", stats.avg_daily_pnl));
    }
    out.push_str(&format!("Halted Days: {halted_days}\n"));
    if skipped_bars > 0 {
        out.push_str(&format!("Skipped Bars: {skipped_bars}\n"));
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

pub fn render_simulation(summary: &SimulationSummary) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(&format!(
        "======= SIMULATION ({} trials x {} days) =======\n",
        summary.num_trials, summary.days_per_trial
    ));
    out.push_str(&format!(
        "Mean Final Equity: ${:.2}\n",
        summary.mean_final_equity
    ));
    out.push_str(&format!("Mean Net Profit: ${:.2}\n", summary.mean_net_profit));
    out.push_str(&format!("Best Case: ${:.2}\n", summary.max_final_equity));
    out.push_str(&format!("Worst Case: ${:.2}\n", summary.min_final_equity));
    out.push_str(&format!(
        "Mean Max Drawdown: {:.2}%\n",
        summary.mean_max_drawdown_pct
    ));
    out.push_str(&format!(
        "95% Confidence Drawdown: < {:.2}%\n",
        summary.drawdown_p95_pct
    ));
    out.push_str(&format!(
        "Risk of Ruin (< ${:.2}): {:.1}%\n",
        summary.ruin_threshold,
        summary.ruin_probability * 100.0
    ));
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Both blocks for a pipeline run.
pub fn render_summary(result: &PipelineResult) -> String {
    let mut out = render_backtest(
        &result.stats,
        result.session.halt_count(),
        result.session.skipped_bars,
    );
    if let Some(sim) = &result.simulation {
        out.push('\n');
        out.push_str(&render_simulation(&sim.summary));
    }
    out
}
