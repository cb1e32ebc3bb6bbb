//! Broker boundary and the in-process simulated broker.
//!
//! The broker is the sole owner of cash. The engine sends it one instruction
//! at a time and receives completed round-turns back.

use crate::domain::{Bar, ClosedTrade, Direction, ExitReason};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BrokerError {
    #[error("cannot open {attempted:?}: a {held:?} lot is already open")]
    LotAlreadyOpen {
        held: Direction,
        attempted: Direction,
    },

    #[error("close requested ({0:?}) with no open lot")]
    NothingToClose(ExitReason),

    #[error("order size must be at least 1")]
    ZeroSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Buy { size: u32 },
    Sell { size: u32 },
    Close(ExitReason),
}

pub trait Broker {
    /// Execute an instruction against `bar`. A `Close` yields the completed trade.
    fn submit(
        &mut self,
        instruction: Instruction,
        bar: &Bar,
    ) -> Result<Option<ClosedTrade>, BrokerError>;

    /// Cash plus the open lot marked at `mark`.
    fn equity(&self, mark: f64) -> f64;

    /// Realized cash balance.
    fn cash(&self) -> f64;
}

// ─── Simulated broker ────────────────────────────────────────────────

/// Cost model and starting balance of the simulated broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub starting_cash: f64,
    /// Flat commission per contract per side.
    pub commission_per_contract: f64,
    /// Proportional slippage applied against the trader on every fill.
    pub slippage_pct: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            starting_cash: 5000.0,
            commission_per_contract: 0.6,
            slippage_pct: 0.0001,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenLot {
    direction: Direction,
    size: u32,
    timestamp: DateTime<FixedOffset>,
    price: f64,
}

/// Fills at the bar close, shifted by slippage, with a fixed contract multiplier.
#[derive(Debug, Clone)]
pub struct SimBroker {
    config: BrokerConfig,
    multiplier: f64,
    cash: f64,
    lot: Option<OpenLot>,
}

impl SimBroker {
    pub fn new(config: BrokerConfig, multiplier: f64) -> Self {
        Self {
            cash: config.starting_cash,
            config,
            multiplier,
            lot: None,
        }
    }

    pub fn open_direction(&self) -> Direction {
        self.lot
            .as_ref()
            .map_or(Direction::Flat, |lot| lot.direction)
    }

    fn fill_price(&self, side: Direction, reference: f64) -> f64 {
        reference * (1.0 + side.sign() * self.config.slippage_pct)
    }

    fn open(&mut self, direction: Direction, size: u32, bar: &Bar) -> Result<(), BrokerError> {
        if size == 0 {
            return Err(BrokerError::ZeroSize);
        }
        if let Some(lot) = &self.lot {
            return Err(BrokerError::LotAlreadyOpen {
                held: lot.direction,
                attempted: direction,
            });
        }
        self.lot = Some(OpenLot {
            direction,
            size,
            timestamp: bar.timestamp,
            price: self.fill_price(direction, bar.close),
        });
        Ok(())
    }

    fn close(&mut self, reason: ExitReason, bar: &Bar) -> Result<ClosedTrade, BrokerError> {
        let lot = self.lot.take().ok_or(BrokerError::NothingToClose(reason))?;
        let exit_price = self.fill_price(lot.direction.opposite(), bar.close);
        let size = f64::from(lot.size);

        let gross_pnl = (exit_price - lot.price) * lot.direction.sign() * size * self.multiplier;
        let commission = 2.0 * self.config.commission_per_contract * size;
        let net_pnl = gross_pnl - commission;
        self.cash += net_pnl;

        Ok(ClosedTrade {
            direction: lot.direction,
            size: lot.size,
            entry_timestamp: lot.timestamp,
            entry_price: lot.price,
            close_timestamp: Some(bar.timestamp),
            exit_price,
            exit_reason: reason,
            gross_pnl,
            commission,
            net_pnl,
        })
    }
}

impl Broker for SimBroker {
    fn submit(
        &mut self,
        instruction: Instruction,
        bar: &Bar,
    ) -> Result<Option<ClosedTrade>, BrokerError> {
        match instruction {
            Instruction::Buy { size } => self.open(Direction::Long, size, bar).map(|()| None),
            Instruction::Sell { size } => self.open(Direction::Short, size, bar).map(|()| None),
            Instruction::Close(reason) => self.close(reason, bar).map(Some),
        }
    }

    fn equity(&self, mark: f64) -> f64 {
        match &self.lot {
            None => self.cash,
            Some(lot) => {
                let open_pnl = (mark - lot.price)
                    * lot.direction.sign()
                    * f64::from(lot.size)
                    * self.multiplier;
                self.cash + open_pnl - self.config.commission_per_contract * f64::from(lot.size)
            }
        }
    }

    fn cash(&self) -> f64 {
        self.cash
    }
}
