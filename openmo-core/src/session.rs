//! Session clock: maps a bar timestamp to a trading-day key and an intraday phase.
//!
//! Timestamps are converted into the configured trading timezone before
//! anything else, so the day key is the local calendar date of the exchange
//! session and not the date of whatever offset the data feed used.

use crate::domain::Bar;
use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("unknown trading timezone '{0}'")]
    InvalidTimezone(String),

    #[error("entry window of {0} minutes does not fit in the trading day")]
    InvalidEntryWindow(u32),

    #[error("forced-flat time {forced_flat} must be after entry time {entry}")]
    ForcedFlatNotAfterEntry {
        entry: NaiveTime,
        forced_flat: NaiveTime,
    },
}

// ─── Configuration ───────────────────────────────────────────────────

/// Time-of-day boundaries of the trading session, in local exchange time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// IANA timezone name, e.g. `America/New_York`.
    pub timezone: String,
    pub market_open: NaiveTime,
    /// Width of the opening window; the bar stamped at open + W is the entry bar.
    pub entry_window_minutes: u32,
    /// Bars at or after this time must be flat.
    pub forced_flat: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            market_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            entry_window_minutes: 5,
            forced_flat: NaiveTime::from_hms_opt(15, 45, 0).unwrap_or_default(),
        }
    }
}

// ─── Classification ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the opening window has completed.
    PreEntryWindow,
    /// The single bar that completes the opening window.
    EntryBar,
    Intraday,
    /// At or after the forced-flat time.
    CloseWindow,
}

/// Result of classifying one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub day: NaiveDate,
    /// True when `day` differs from the previously seen day (or none was seen).
    pub new_day: bool,
    pub phase: Phase,
}

#[derive(Debug, Clone)]
pub struct SessionClock {
    tz: Tz,
    entry_time: NaiveTime,
    forced_flat: NaiveTime,
}

impl SessionClock {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let tz = config
            .timezone
            .parse::<Tz>()
            .map_err(|_| SessionError::InvalidTimezone(config.timezone.clone()))?;

        let (entry_time, overflow) = config
            .market_open
            .overflowing_add_signed(Duration::minutes(i64::from(config.entry_window_minutes)));
        if overflow != 0 {
            return Err(SessionError::InvalidEntryWindow(config.entry_window_minutes));
        }
        if config.forced_flat <= entry_time {
            return Err(SessionError::ForcedFlatNotAfterEntry {
                entry: entry_time,
                forced_flat: config.forced_flat,
            });
        }

        Ok(Self {
            tz,
            entry_time,
            forced_flat: config.forced_flat,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn entry_time(&self) -> NaiveTime {
        self.entry_time
    }

    /// Trading-day key of a bar.
    pub fn day_of(&self, bar: &Bar) -> NaiveDate {
        bar.timestamp.with_timezone(&self.tz).date_naive()
    }

    /// Pure classification of `bar` given the previously seen day key.
    pub fn classify(&self, prev_day: Option<NaiveDate>, bar: &Bar) -> Tick {
        let local = bar.timestamp.with_timezone(&self.tz);
        let day = local.date_naive();
        let time = local.time();

        let phase = if time >= self.forced_flat {
            Phase::CloseWindow
        } else if time == self.entry_time {
            Phase::EntryBar
        } else if time < self.entry_time {
            Phase::PreEntryWindow
        } else {
            Phase::Intraday
        };

        Tick {
            day,
            new_day: prev_day != Some(day),
            phase,
        }
    }
}
