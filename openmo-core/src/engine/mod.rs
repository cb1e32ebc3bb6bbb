//! Session engine: the single-threaded bar loop and its broker boundary.
//!
//! The engine consumes an ordered bar slice plus one indicator reading per
//! bar and drives the session clock, risk governor, signal machine, broker
//! and daily PnL aggregator in that order for every bar.

pub mod broker;
pub mod loop_runner;
pub mod state;

pub use broker::{Broker, BrokerConfig, BrokerError, Instruction, SimBroker};
pub use loop_runner::{run_session, run_session_with_indicators};
pub use state::{DaySummary, EngineConfig, EngineError, EventKind, SessionEvent, SessionResult};
