//! openmo core: opening-momentum intraday rule evaluation.
//!
//! This crate holds the single-instrument decision pipeline:
//! - Domain types (bars, position state, closed trades)
//! - Lagging indicators (Wilder ATR, simple moving average)
//! - Session clock (trading-day key and intraday phase)
//! - Daily risk governor with a sticky halt
//! - Position/signal state machine (entry, trailing and volume reversals)
//! - Daily PnL aggregation by close day
//! - Broker boundary and a simulated broker
//! - Deterministic per-trial RNG seeding for the bootstrap

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod machine;
pub mod pnl;
pub mod risk;
pub mod rng;
pub mod session;

pub use machine::{
    Action, DayContext, DayStatus, ParamsError, SignalMachine, StateError, StrategyParams,
};
pub use pnl::{AggregateError, DailyPnl, DailyPnlAggregator, DayPnl};
pub use risk::RiskGovernor;
pub use rng::TrialSeeder;
pub use session::{Phase, SessionClock, SessionConfig, SessionError, Tick};
