//! Domain types for openmo

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use position::{Direction, PositionState};
pub use trade::{ClosedTrade, ExitReason, ReversalTrigger};
