//! Daily PnL aggregation.
//!
//! Buckets closed-trade net PnL by the trading-day key of the close
//! timestamp. Days appear in first-seen order; days without a closed trade
//! never appear.

use crate::domain::ClosedTrade;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("closed trade entered at {entry} has no close timestamp")]
    MissingCloseTimestamp { entry: DateTime<FixedOffset> },
}

/// Net PnL of one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPnl {
    pub date: NaiveDate,
    pub pnl: f64,
    pub trade_count: usize,
}

/// Chronological daily PnL sequence, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub days: Vec<DayPnl>,
}

impl DailyPnl {
    /// Build from `(date, pnl)` rows, e.g. a previously exported file.
    pub fn from_rows(rows: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let days = rows
            .into_iter()
            .map(|(date, pnl)| DayPnl {
                date,
                pnl,
                trade_count: 0,
            })
            .collect();
        Self { days }
    }

    /// PnL values in day order: the bootstrap input.
    pub fn values(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.pnl).collect()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.days.iter().map(|d| d.pnl).sum()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayPnl> {
        self.days.iter().find(|d| d.date == date)
    }
}

#[derive(Debug)]
pub struct DailyPnlAggregator {
    tz: Tz,
    days: Vec<DayPnl>,
    index: HashMap<NaiveDate, usize>,
}

impl DailyPnlAggregator {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            days: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn on_trade_closed(&mut self, trade: &ClosedTrade) -> Result<(), AggregateError> {
        let closed_at = trade
            .close_timestamp
            .ok_or(AggregateError::MissingCloseTimestamp {
                entry: trade.entry_timestamp,
            })?;
        let date = closed_at.with_timezone(&self.tz).date_naive();

        let slot = match self.index.get(&date) {
            Some(&i) => i,
            None => {
                self.days.push(DayPnl {
                    date,
                    pnl: 0.0,
                    trade_count: 0,
                });
                self.index.insert(date, self.days.len() - 1);
                self.days.len() - 1
            }
        };
        let day = &mut self.days[slot];
        day.pnl += trade.net_pnl;
        day.trade_count += 1;
        Ok(())
    }

    pub fn finalize(self) -> DailyPnl {
        DailyPnl { days: self.days }
    }
}
