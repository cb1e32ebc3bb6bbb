//! ClosedTrade: a completed round-turn emitted by the broker.

use super::position::Direction;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Rule that flipped the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalTrigger {
    TrailingStop,
    VolumeSpike,
}

/// Why a lot was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Closed as the first leg of a stop-and-reverse.
    Reversal(ReversalTrigger),
    /// Forced flat inside the close window.
    SessionClose,
    /// Daily loss limit breached.
    DailyLossLimit,
    /// Still open when the next trading day started.
    SessionRollover,
    /// Still open when the bar stream ended.
    EndOfData,
}

/// A complete round-turn trade: entry → exit, commission-adjusted.
///
/// `close_timestamp` is optional because the broker boundary is external; the
/// daily aggregator rejects trades without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub size: u32,

    // ── Entry ──
    pub entry_timestamp: DateTime<FixedOffset>,
    pub entry_price: f64,

    // ── Exit ──
    pub close_timestamp: Option<DateTime<FixedOffset>>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── PnL ──
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> ClosedTrade {
        ClosedTrade {
            direction: Direction::Long,
            size: 1,
            entry_timestamp: DateTime::parse_from_rfc3339("2024-01-02T09:35:00-05:00").unwrap(),
            entry_price: 5005.0,
            close_timestamp: Some(
                DateTime::parse_from_rfc3339("2024-01-02T15:45:00-05:00").unwrap(),
            ),
            exit_price: 5025.0,
            exit_reason: ExitReason::SessionClose,
            gross_pnl: 40.0,
            commission: 1.2,
            net_pnl: 38.8,
        }
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
        let mut loser = sample_trade();
        loser.net_pnl = -1.2;
        assert!(!loser.is_winner());
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::Reversal(ReversalTrigger::VolumeSpike)).unwrap();
        assert_eq!(json, r#"{"reversal":"volume_spike"}"#);
        let json = serde_json::to_string(&ExitReason::DailyLossLimit).unwrap();
        assert_eq!(json, r#""daily_loss_limit""#);
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: ClosedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
