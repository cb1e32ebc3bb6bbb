//! Indicator provider: lagging ATR and volume moving average.
//!
//! Indicators are pure functions: bar history in, numeric series out. They
//! are precomputed once before the bar loop and handed to the engine as one
//! `BarIndicators` per bar. Warm-up values are `None`, never guessed.

pub mod atr;
pub mod sma;

pub use atr::Atr;
pub use sma::VolumeSma;

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. Warm-up values are `f64::NAN`.
///
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Indicator readings for a single bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BarIndicators {
    pub atr: Option<f64>,
    pub volume_ma: Option<f64>,
}

impl BarIndicators {
    /// Both inputs defined: entries are allowed.
    pub fn is_ready(&self) -> bool {
        self.atr.is_some() && self.volume_ma.is_some()
    }
}

/// Precompute per-bar ATR and volume SMA readings.
pub fn precompute_indicators(
    bars: &[Bar],
    atr_period: usize,
    volume_ma_period: usize,
) -> Vec<BarIndicators> {
    let atr = Atr::new(atr_period).compute(bars);
    let volume_ma = VolumeSma::new(volume_ma_period).compute(bars);

    atr.into_iter()
        .zip(volume_ma)
        .map(|(a, v)| BarIndicators {
            atr: defined(a),
            volume_ma: defined(v),
        })
        .collect()
}

fn defined(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Create synthetic 5-minute bars from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::DateTime::parse_from_rfc3339("2024-01-02T09:35:00-05:00").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
