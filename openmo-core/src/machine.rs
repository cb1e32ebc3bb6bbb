//! Position/signal state machine for the opening-momentum rule.
//!
//! One decision per bar at most. The machine owns the live [`PositionState`]
//! and the per-day [`DayContext`] is threaded through by the caller, which
//! rebuilds it at each day boundary.
//!
//! Precedence within a bar: daily-loss breach, then close window, then the
//! entry bar, then management (trailing stop before volume spike).

use crate::domain::{Bar, Direction, ExitReason, PositionState, ReversalTrigger};
use crate::indicators::BarIndicators;
use crate::session::Phase;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("cannot enter {attempted:?}: already holding {held:?}")]
    EnterWhilePositioned {
        held: Direction,
        attempted: Direction,
    },

    #[error("cannot reverse while flat")]
    ReverseWhileFlat,

    #[error("entry direction must be long or short")]
    FlatEntry,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("daily loss limit must be positive, got {0}")]
    NonPositiveLossLimit(f64),

    #[error("lot size must be at least 1")]
    ZeroLotSize,

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{0} window must be at least 1 bar")]
    ZeroWindow(&'static str),
}

// ─── Parameters ──────────────────────────────────────────────────────

/// Immutable strategy parameters, handed to the machine by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Flatten and halt once the day's estimated PnL drops below `-daily_loss_limit`.
    pub daily_loss_limit: f64,
    /// Contracts per trade.
    pub lot_size: u32,
    /// Reversal distance from the extreme, in ATR multiples.
    pub trail_atr_multiplier: f64,
    /// Volume above `volume_ma * volume_spike_multiplier` counts as a spike.
    pub volume_spike_multiplier: f64,
    /// Currency per point per contract.
    pub point_value: f64,
    pub atr_period: usize,
    pub volume_ma_period: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            daily_loss_limit: 200.0,
            lot_size: 1,
            trail_atr_multiplier: 3.0,
            volume_spike_multiplier: 3.0,
            point_value: 2.0,
            atr_period: 14,
            volume_ma_period: 20,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.daily_loss_limit > 0.0) {
            return Err(ParamsError::NonPositiveLossLimit(self.daily_loss_limit));
        }
        if self.lot_size == 0 {
            return Err(ParamsError::ZeroLotSize);
        }
        for (name, value) in [
            ("trail_atr_multiplier", self.trail_atr_multiplier),
            ("volume_spike_multiplier", self.volume_spike_multiplier),
            ("point_value", self.point_value),
        ] {
            if !(value > 0.0) {
                return Err(ParamsError::NonPositive { name, value });
            }
        }
        if self.atr_period == 0 {
            return Err(ParamsError::ZeroWindow("atr"));
        }
        if self.volume_ma_period == 0 {
            return Err(ParamsError::ZeroWindow("volume_ma"));
        }
        Ok(())
    }
}

// ─── Per-day context ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    AwaitingEntry,
    InPosition(Direction),
    Halted,
    ClosedForDay,
}

/// State scoped to one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayContext {
    pub day: NaiveDate,
    pub start_equity: f64,
    pub status: DayStatus,
    pub entry_taken: bool,
    pub reversals: u32,
}

impl DayContext {
    pub fn new(day: NaiveDate, start_equity: f64) -> Self {
        Self {
            day,
            start_equity,
            status: DayStatus::AwaitingEntry,
            entry_taken: false,
            reversals: 0,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.status == DayStatus::Halted
    }

    /// Halted or past the close window: nothing more happens today.
    pub fn is_done(&self) -> bool {
        matches!(self.status, DayStatus::Halted | DayStatus::ClosedForDay)
    }

    /// End the day once any open lot is flat. A halt stays a halt.
    pub fn close(&mut self) {
        if !self.is_halted() {
            self.status = DayStatus::ClosedForDay;
        }
    }
}

// ─── Actions ─────────────────────────────────────────────────────────

/// Decision emitted for a bar. The engine turns it into broker instructions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Enter {
        direction: Direction,
    },
    Reverse {
        from: Direction,
        to: Direction,
        trigger: ReversalTrigger,
    },
    Flatten {
        from: Direction,
        reason: ExitReason,
    },
}

// ─── Machine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SignalMachine {
    params: StrategyParams,
    position: PositionState,
    prev_close: Option<f64>,
}

impl SignalMachine {
    pub fn new(params: StrategyParams) -> Self {
        Self {
            params,
            position: PositionState::flat(),
            prev_close: None,
        }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    /// Process one bar. `breached` is the risk governor's verdict for this bar.
    pub fn on_bar(
        &mut self,
        ctx: &mut DayContext,
        bar: &Bar,
        phase: Phase,
        indicators: &BarIndicators,
        breached: bool,
    ) -> Result<Option<Action>, StateError> {
        // Single-bar comparison against the preceding bar, across day boundaries.
        let prev_close = self.prev_close.replace(bar.close);

        if breached && !ctx.is_halted() {
            ctx.status = DayStatus::Halted;
            return Ok(self.flatten(ExitReason::DailyLossLimit));
        }
        if ctx.is_done() {
            return Ok(None);
        }

        match phase {
            Phase::CloseWindow => {
                ctx.status = DayStatus::ClosedForDay;
                Ok(self.flatten(ExitReason::SessionClose))
            }
            Phase::EntryBar => {
                if ctx.entry_taken {
                    return Ok(None);
                }
                if !indicators.is_ready() {
                    debug!(day = %ctx.day, "indicators warming up, no entry");
                    return Ok(None);
                }
                let direction = if bar.is_bullish() {
                    Direction::Long
                } else {
                    Direction::Short
                };
                let action = self.enter(direction, bar)?;
                ctx.entry_taken = true;
                ctx.status = DayStatus::InPosition(direction);
                Ok(Some(action))
            }
            Phase::PreEntryWindow | Phase::Intraday => {
                if !self.position.is_open() {
                    return Ok(None);
                }
                let action = self.manage(bar, indicators, prev_close)?;
                if let Some(Action::Reverse { to, .. }) = action {
                    ctx.reversals += 1;
                    ctx.status = DayStatus::InPosition(to);
                }
                Ok(action)
            }
        }
    }

    /// Open a lot at the bar's close, seeding the extreme from its range.
    pub fn enter(&mut self, direction: Direction, bar: &Bar) -> Result<Action, StateError> {
        if direction.is_flat() {
            return Err(StateError::FlatEntry);
        }
        if self.position.is_open() {
            return Err(StateError::EnterWhilePositioned {
                held: self.position.direction,
                attempted: direction,
            });
        }
        self.position = PositionState::open(direction, bar.close, bar.high, bar.low);
        debug!(
            ts = %bar.timestamp,
            ?direction,
            entry = bar.close,
            extreme = self.position.extreme_price,
            "opening-bar entry"
        );
        Ok(Action::Enter { direction })
    }

    /// Close the lot and open the opposite one on the same bar.
    pub fn reverse(&mut self, trigger: ReversalTrigger, bar: &Bar) -> Result<Action, StateError> {
        if !self.position.is_open() {
            return Err(StateError::ReverseWhileFlat);
        }
        let from = self.position.direction;
        let to = from.opposite();
        self.position = PositionState::open(to, bar.close, bar.high, bar.low);
        debug!(ts = %bar.timestamp, ?trigger, ?from, ?to, "reversal");
        Ok(Action::Reverse { from, to, trigger })
    }

    /// Force the position flat. `None` if already flat.
    pub fn flatten(&mut self, reason: ExitReason) -> Option<Action> {
        if !self.position.is_open() {
            return None;
        }
        let from = self.position.direction;
        self.position = PositionState::flat();
        debug!(?from, ?reason, "flatten");
        Some(Action::Flatten { from, reason })
    }

    fn manage(
        &mut self,
        bar: &Bar,
        indicators: &BarIndicators,
        prev_close: Option<f64>,
    ) -> Result<Option<Action>, StateError> {
        self.position.update_extreme(bar.high, bar.low);

        if let Some(atr) = indicators.atr {
            let distance = atr * self.params.trail_atr_multiplier;
            let extreme = self.position.extreme_price;
            let stopped = match self.position.direction {
                Direction::Long => bar.close < extreme - distance,
                Direction::Short => bar.close > extreme + distance,
                Direction::Flat => false,
            };
            if stopped {
                return self.reverse(ReversalTrigger::TrailingStop, bar).map(Some);
            }
        }

        if let (Some(volume_ma), Some(prev_close)) = (indicators.volume_ma, prev_close) {
            let spike = bar.volume > volume_ma * self.params.volume_spike_multiplier;
            let against = match self.position.direction {
                Direction::Long => bar.close < prev_close,
                Direction::Short => bar.close > prev_close,
                Direction::Flat => false,
            };
            if spike && against {
                return self.reverse(ReversalTrigger::VolumeSpike, bar).map(Some);
            }
        }

        Ok(None)
    }
}
