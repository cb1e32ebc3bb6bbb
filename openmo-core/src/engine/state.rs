//! Engine configuration, session events and run result types.

use crate::domain::ClosedTrade;
use crate::machine::{Action, DayContext, DayStatus, ParamsError, StateError, StrategyParams};
use crate::pnl::{AggregateError, DailyPnl};
use crate::session::{SessionConfig, SessionError};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::broker::BrokerError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("invalid session configuration: {0}")]
    Session(#[from] SessionError),

    #[error("state machine invariant violated: {0}")]
    State(#[from] StateError),

    #[error("broker rejected instruction: {0}")]
    Broker(#[from] BrokerError),

    #[error("daily aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("{indicators} indicator readings for {bars} bars")]
    IndicatorLengthMismatch { bars: usize, indicators: usize },
}

/// Configuration for one pass over a bar stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub params: StrategyParams,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Action(Action),
    /// Daily loss limit tripped; carries the governor's estimate.
    Halted { estimated_pnl: f64 },
}

/// Something the engine did, stamped with the bar it happened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub timestamp: DateTime<FixedOffset>,
    pub day: NaiveDate,
    pub kind: EventKind,
}

/// How a trading day went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: NaiveDate,
    pub start_equity: f64,
    pub end_equity: f64,
    pub entered: bool,
    pub reversals: u32,
    pub final_status: DayStatus,
}

impl DaySummary {
    pub(crate) fn from_context(ctx: &DayContext, end_equity: f64) -> Self {
        Self {
            day: ctx.day,
            start_equity: ctx.start_equity,
            end_equity,
            entered: ctx.entry_taken,
            reversals: ctx.reversals,
            final_status: ctx.status,
        }
    }

    pub fn halted(&self) -> bool {
        self.final_status == DayStatus::Halted
    }
}

/// Result of a completed session run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub trades: Vec<ClosedTrade>,
    pub daily: DailyPnl,
    pub days: Vec<DaySummary>,
    pub events: Vec<SessionEvent>,
    pub bars_processed: usize,
    pub skipped_bars: usize,
    pub starting_equity: f64,
    pub final_equity: f64,
}

impl SessionResult {
    pub fn halt_count(&self) -> usize {
        self.days.iter().filter(|d| d.halted()).count()
    }
}
