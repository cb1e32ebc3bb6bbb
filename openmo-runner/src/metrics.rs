//! Backtest metrics: pure functions over closed trades and the daily PnL sequence.
//!
//! No dependencies on the runner, loader or bootstrap beyond the shared
//! drawdown walk.

use openmo_core::domain::ClosedTrade;
use openmo_core::DailyPnl;
use serde::{Deserialize, Serialize};

use crate::bootstrap::DrawdownWalk;

/// Summary of a single backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub won: usize,
    pub lost: usize,
    /// Percent of trades with positive net PnL.
    pub win_rate: f64,
    pub net_pnl: f64,
    pub gross_pnl: f64,
    pub total_commission: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Max drawdown of the realized daily equity curve, in percent.
    pub max_drawdown_pct: f64,
    /// Longest run of trading days spent below a prior equity peak.
    pub max_drawdown_len_days: usize,
    pub avg_daily_pnl: f64,
    pub trading_days: usize,
}

impl TradeStats {
    pub fn compute(trades: &[ClosedTrade], daily: &DailyPnl, starting_equity: f64) -> Self {
        let curve = realized_equity_curve(daily, starting_equity);
        let won = trades.iter().filter(|t| t.is_winner()).count();
        Self {
            total_trades: trades.len(),
            won,
            lost: trades.len() - won,
            win_rate: win_rate(trades),
            net_pnl: trades.iter().map(|t| t.net_pnl).sum(),
            gross_pnl: trades.iter().map(|t| t.gross_pnl).sum(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            profit_factor: profit_factor(trades),
            largest_win: trades.iter().map(|t| t.net_pnl).fold(0.0, f64::max),
            largest_loss: trades.iter().map(|t| t.net_pnl).fold(0.0, f64::min),
            max_drawdown_pct: max_drawdown(&curve) * 100.0,
            max_drawdown_len_days: max_drawdown_duration(&curve),
            avg_daily_pnl: avg_daily_pnl(daily),
            trading_days: daily.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Starting equity followed by the balance after each trading day.
pub fn realized_equity_curve(daily: &DailyPnl, starting_equity: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(daily.len() + 1);
    curve.push(starting_equity);
    let mut equity = starting_equity;
    for day in &daily.days {
        equity += day.pnl;
        curve.push(equity);
    }
    curve
}

/// Percent of trades with positive net PnL. 0.0 with no trades.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Gross profit / gross loss on net PnL. 0.0 when nothing was lost.
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    let profit: f64 = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).sum();
    let loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();
    if loss > 0.0 {
        profit / loss
    } else {
        0.0
    }
}

/// Maximum drawdown as a fraction, peak starting at the first value.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&start) = equity_curve.first() else {
        return 0.0;
    };
    let mut walk = DrawdownWalk::new(start);
    for &equity in equity_curve {
        walk.observe(equity);
    }
    walk.max_drawdown()
}

/// Longest stretch of consecutive points strictly below the running peak.
pub fn max_drawdown_duration(equity_curve: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0usize;
    let mut longest = 0usize;
    for &equity in equity_curve {
        if equity >= peak {
            peak = equity;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

pub fn avg_daily_pnl(daily: &DailyPnl) -> f64 {
    if daily.is_empty() {
        return 0.0;
    }
    daily.total() / daily.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use openmo_core::domain::{Direction, ExitReason};

    fn trade(net: f64) -> ClosedTrade {
        let ts = DateTime::parse_from_rfc3339("2024-03-04T10:00:00-05:00").unwrap();
        ClosedTrade {
            direction: Direction::Long,
            size: 1,
            entry_timestamp: ts,
            entry_price: 5000.0,
            close_timestamp: Some(ts),
            exit_price: 5000.0,
            exit_reason: ExitReason::SessionClose,
            gross_pnl: net + 1.2,
            commission: 1.2,
            net_pnl: net,
        }
    }

    fn daily(values: &[f64]) -> DailyPnl {
        let first = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        DailyPnl::from_rows(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (first + chrono::Duration::days(i as i64), v)),
        )
    }

    #[test]
    fn win_rate_and_counts() {
        let trades = vec![trade(10.0), trade(-5.0), trade(0.0), trade(20.0)];
        let stats = TradeStats::compute(&trades, &daily(&[25.0]), 5000.0);
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.won, 2);
        assert_eq!(stats.lost, 2);
        assert_eq!(stats.win_rate, 50.0);
        assert_eq!(stats.net_pnl, 25.0);
        assert!((stats.total_commission - 4.8).abs() < 1e-12);
        assert_eq!(stats.largest_win, 20.0);
        assert_eq!(stats.largest_loss, -5.0);
        assert_eq!(profit_factor(&trades), 6.0);
    }

    #[test]
    fn no_trades() {
        let stats = TradeStats::compute(&[], &DailyPnl::default(), 5000.0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.profit_factor, 0.0);
        assert_eq!(stats.max_drawdown_pct, 0.0);
        assert_eq!(stats.avg_daily_pnl, 0.0);
        assert_eq!(stats.trading_days, 0);
    }

    #[test]
    fn profit_factor_without_losers() {
        assert_eq!(profit_factor(&[trade(5.0)]), 0.0);
    }

    #[test]
    fn realized_curve_and_drawdown() {
        let d = daily(&[500.0, -1100.0, 100.0, 600.0, -50.0]);
        let curve = realized_equity_curve(&d, 5000.0);
        assert_eq!(curve, vec![5000.0, 5500.0, 4400.0, 4500.0, 5100.0, 5050.0]);
        // Peak 5500 → 4400 = 20%.
        assert!((max_drawdown(&curve) - 0.2).abs() < 1e-12);
        // 4400, 4500, 5100, 5050 are all below 5500.
        assert_eq!(max_drawdown_duration(&curve), 4);
        assert!((avg_daily_pnl(&d) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn monotone_curve_has_no_drawdown() {
        let curve = [5000.0, 5100.0, 5100.0, 5200.0];
        assert_eq!(max_drawdown(&curve), 0.0);
        assert_eq!(max_drawdown_duration(&curve), 0);
    }
}
