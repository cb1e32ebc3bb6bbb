//! Daily risk governor.
//!
//! Tracks realized PnL for the current trading day plus an estimate of the
//! open lot's unrealized PnL, and trips a halt once the sum drops strictly
//! below `-loss_limit`. A halt is sticky until the next `reset`.

use crate::domain::PositionState;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RiskGovernor {
    loss_limit: f64,
    lot_size: u32,
    day_start_equity: f64,
    realized: f64,
    halted: bool,
}

impl RiskGovernor {
    pub fn new(loss_limit: f64, lot_size: u32) -> Self {
        Self {
            loss_limit,
            lot_size,
            day_start_equity: 0.0,
            realized: 0.0,
            halted: false,
        }
    }

    /// Start a new trading day.
    pub fn reset(&mut self, day_start_equity: f64) {
        self.day_start_equity = day_start_equity;
        self.realized = 0.0;
        self.halted = false;
    }

    pub fn accumulate_realized(&mut self, pnl: f64) {
        self.realized += pnl;
    }

    /// Shadow estimate of the open lot's PnL at `close`.
    ///
    /// Uses the decision price as the entry, so it ignores slippage and
    /// commission and can differ from the broker's mark-to-market.
    pub fn unrealized_estimate(
        &self,
        position: &PositionState,
        close: f64,
        per_point_multiplier: f64,
    ) -> f64 {
        if !position.is_open() {
            return 0.0;
        }
        position.points_from_entry(close) * per_point_multiplier * f64::from(self.lot_size)
    }

    /// Returns true exactly once per day: on the bar that breaches the limit.
    pub fn evaluate(
        &mut self,
        position: &PositionState,
        close: f64,
        per_point_multiplier: f64,
    ) -> bool {
        if self.halted {
            return false;
        }

        let estimated = self.realized + self.unrealized_estimate(position, close, per_point_multiplier);
        if estimated < -self.loss_limit {
            warn!(
                estimated_daily_pnl = estimated,
                limit = self.loss_limit,
                "daily loss limit hit, flattening and halting"
            );
            self.halted = true;
            return true;
        }
        false
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn realized(&self) -> f64 {
        self.realized
    }

    pub fn day_start_equity(&self) -> f64 {
        self.day_start_equity
    }

    pub fn loss_limit(&self) -> f64 {
        self.loss_limit
    }
}
