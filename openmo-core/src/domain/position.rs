//! Directional position state owned by the signal state machine.

use serde::{Deserialize, Serialize};

/// Held direction. At most one lot of fixed size is open when not `Flat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Flat,
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Flat => 0.0,
        }
    }

    /// The opposite side. Flat has no opposite and maps to itself.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
            Direction::Flat => Direction::Flat,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Direction::Flat
    }
}

/// Live position as seen by the state machine.
///
/// `extreme_price` is the highest high since entry while long and the lowest
/// low while short; trailing reversals are measured from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub direction: Direction,
    pub entry_price: f64,
    pub extreme_price: f64,
}

impl PositionState {
    pub fn flat() -> Self {
        Self {
            direction: Direction::Flat,
            entry_price: 0.0,
            extreme_price: 0.0,
        }
    }

    /// Open a position, seeding the extreme from the bar's range.
    pub fn open(direction: Direction, entry_price: f64, bar_high: f64, bar_low: f64) -> Self {
        let extreme_price = match direction {
            Direction::Long => bar_high,
            Direction::Short => bar_low,
            Direction::Flat => 0.0,
        };
        Self {
            direction,
            entry_price,
            extreme_price,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.direction.is_flat()
    }

    /// Ratchet the extreme in the favourable direction only.
    pub fn update_extreme(&mut self, bar_high: f64, bar_low: f64) {
        match self.direction {
            Direction::Long => self.extreme_price = self.extreme_price.max(bar_high),
            Direction::Short => self.extreme_price = self.extreme_price.min(bar_low),
            Direction::Flat => {}
        }
    }

    /// Price distance from entry, signed by direction. Zero when flat.
    pub fn points_from_entry(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.direction.sign()
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::flat()
    }
}
